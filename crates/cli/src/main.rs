/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use pico_args::Arguments;
use std::io;
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};
use vnscript_bytecode::bank::{INTL_LOCATION, STRK_LOCATION};
use vnscript_bytecode::encode;
use vnscript_bytecode::parse::parse_token;
use vnscript_bytecode::prelude::*;
use vnscript_modules::prelude::{JMP_MODULE, register_standard_modules};
use vnscript_vm::prelude::*;

const MSG_MODULE: (u8, u8) = (1, 3);

pub fn init_logger() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::OFF.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage<W: Write>(mut out: W) {
    let _ = write!(
        out,
        "\
Usage: vnscript [OPTIONS] <printable-token>...\n\n\
Tokens are written in printable form, for example \"$ ff 05 00 00 00\".\n\n\
Options:\n\
  -e, --eval              (evaluate each token against a fresh machine)\n\
  -d, --demo              (run the built-in gosub_with / ret_with demo)\n\
  -t, --trace             (print one line per dispatched instruction)\n\
  -h, --help              (print this help and exit)\n"
    );
}

fn fresh_machine(archive: Archive, trace: bool) -> Result<Machine, VmError> {
    let mut machine = Machine::new(
        archive,
        MachineSetup {
            trace,
            ..MachineSetup::default()
        },
    )?;
    register_standard_modules(&mut machine)?;
    Ok(machine)
}

fn evaluate(piece: &ExpressionPiece) -> Result<String, VmError> {
    let mut archive = Archive::new();
    archive.add(Scenario::new(0));
    let mut machine = fresh_machine(archive, false)?;

    match piece.value_type() {
        ValueType::Integer => machine.int_value(piece).map(|value| value.to_string()),
        ValueType::String => machine.string_value(piece).map(|value| format!("{value:?}")),
    }
}

fn inspect(printable: &str, eval: bool) -> Result<(), VmError> {
    let bytes = printable_to_parsable(printable)?;
    debug!(len = bytes.len(), "inspecting token");

    println!("{}", tinter::bright_black(&hexify::format_hex(&bytes)));
    let piece = parse_token(&bytes, get_data)?;
    println!(
        "{} {} {}",
        tinter::cyan(&piece.value_type().to_string()),
        tinter::bright_black("->"),
        piece
    );

    if eval {
        let value = evaluate(&piece)?;
        println!("{} {}", tinter::bright_black("="), tinter::yellow(&value));
    }
    Ok(())
}

fn msg_module() -> Result<Module, RegistrationError> {
    let mut module = Module::new(MSG_MODULE.0, MSG_MODULE.1, "Msg");
    module.add_opcode(
        0,
        0,
        "print",
        opcode::<(StrConstant,), _>(|_, (text,)| {
            println!("{}", tinter::green(&text));
            Ok(())
        }),
    )?;
    module.add_opcode(
        0,
        1,
        "print",
        opcode::<(IntConstant,), _>(|_, (value,)| {
            println!("{}", tinter::yellow(&value.to_string()));
            Ok(())
        }),
    )?;
    Ok(module)
}

fn jmp(opcode: u16, overload: u8, parameters: Vec<Vec<u8>>) -> Instruction {
    Instruction::new(
        OpcodeIdentity::new(JMP_MODULE.0, JMP_MODULE.1, opcode, overload),
        parameters,
    )
}

fn print(overload: u8, parameter: Vec<u8>) -> Instruction {
    Instruction::new(
        OpcodeIdentity::new(MSG_MODULE.0, MSG_MODULE.1, 0, overload),
        vec![parameter],
    )
}

/// Calls a subroutine with an integer and a string argument. The callee
/// prints the string and returns twice the integer, which the caller prints.
fn demo_scenario() -> Scenario {
    let mut doubled = encode::memory_reference(INTL_LOCATION, 0);
    doubled.extend_from_slice(b"\\\x02");
    doubled.extend(encode::int_constant(2));

    let mut scenario = Scenario::new(0);
    scenario.push(
        jmp(
            16,
            0,
            vec![
                encode::special(0, &[encode::int_constant(21)]),
                encode::special(1, &[encode::string("hello from the caller")]),
            ],
        )
        .with_pointers(vec![3])
        .with_line(10),
    );
    scenario.push(print(1, encode::store_register()).with_line(11));
    scenario.push(jmp(0, 0, vec![]).with_pointers(vec![5]).with_line(12));
    scenario.push(print(0, encode::memory_reference(STRK_LOCATION, 0)).with_line(20));
    scenario.push(jmp(17, 0, vec![doubled]).with_line(21));
    scenario
}

fn demo(trace: bool) -> Result<(), VmError> {
    let mut archive = Archive::new();
    archive.add(demo_scenario());
    let mut machine = fresh_machine(archive, trace)?;
    machine.attach_module(msg_module()?)?;

    let steps = machine.run(100)?;
    for line in machine.take_trace_log() {
        eprintln!("{}", tinter::bright_black(&line));
    }
    eprintln!(
        "{} after {steps} steps, store register {}",
        tinter::blue("halted"),
        machine.store_register()
    );
    Ok(())
}

fn main() -> ExitCode {
    let mut args = Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print_usage(io::stdout());
        return ExitCode::from(1);
    }

    let eval = args.contains(["-e", "--eval"]);
    let run_demo = args.contains(["-d", "--demo"]);
    let trace = args.contains(["-t", "--trace"]);

    let tokens: Vec<String> = match args
        .finish()
        .into_iter()
        .map(|arg| arg.into_string())
        .collect::<Result<_, _>>()
    {
        Ok(tokens) => tokens,
        Err(arg) => {
            eprintln!("error: argument is not valid unicode: {arg:?}\n");
            print_usage(io::stderr());
            return ExitCode::from(1);
        }
    };

    if tokens.is_empty() && !run_demo {
        print_usage(io::stderr());
        return ExitCode::from(1);
    }

    init_logger();

    let mut something_failed = false;

    for token in &tokens {
        if let Err(err) = inspect(token, eval) {
            error!(%err, %token, "could not inspect token");
            eprintln!("{} {err}", tinter::red("error:"));
            something_failed = true;
        }
    }

    if run_demo {
        if let Err(err) = demo(trace) {
            error!(%err, "demo failed");
            eprintln!("{} {err}", tinter::red("error:"));
            something_failed = true;
        }
    }

    if something_failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
