/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */

//! Jumps, subroutine calls and returns. `Jmp` (0:1) and `Bra` (0:6) share
//! every operation, but `Bra` swaps `goto`/`goto_if` and only has the
//! argument-less `ret_with`/`rtl_with`.

use tracing::trace;
use vnscript_bytecode::parse::{get_expression, parse_token};
use vnscript_bytecode::prelude::{ExpressionPiece, Instruction, ParseError};
use vnscript_vm::error::{RegistrationError, VmError};
use vnscript_vm::module::Module;
use vnscript_vm::operation::{Opcode, Operation, SpecialCase, opcode, special_case};
use vnscript_vm::param::{
    Argc, DefaultTagMapper, IntConstant, Overload2, Param, Special, StrConstant,
};
use vnscript_vm::Machine;

pub const JMP_MODULE: (u8, u8) = (0, 1);
pub const BRA_MODULE: (u8, u8) = (0, 6);

/// Arguments of the `*_with` calls: `a\x00` tags an integer and `a\x01` a
/// string.
pub type WithArgument = Special<DefaultTagMapper, (IntConstant, StrConstant)>;
pub type WithArguments = Argc<WithArgument>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Transfer {
    Goto,
    Gosub,
}

impl Transfer {
    fn to(self, machine: &mut Machine, index: usize) -> Result<(), VmError> {
        match self {
            Self::Goto => machine.goto(index),
            Self::Gosub => machine.gosub(index),
        }
    }
}

fn condition(machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<i32, VmError> {
    let piece = parsed.first().ok_or(ParseError::MissingParameter {
        descriptor: "condition",
        position: 0,
    })?;
    machine.int_value(piece)
}

/// `goto` / `gosub`
struct Unconditional(Transfer);

impl SpecialCase for Unconditional {
    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        _parsed: &[ExpressionPiece],
    ) -> Result<(), VmError> {
        let target = instruction.required_pointer(0)?;
        self.0.to(machine, target)
    }
}

/// `goto_if`, `goto_unless` and the gosub variants.
struct Conditional {
    transfer: Transfer,
    jump_when: bool,
}

impl SpecialCase for Conditional {
    fn parse_as_expressions(&self) -> bool {
        true
    }

    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        parsed: &[ExpressionPiece],
    ) -> Result<(), VmError> {
        if (condition(machine, parsed)? != 0) == self.jump_when {
            let target = instruction.required_pointer(0)?;
            self.transfer.to(machine, target)
        } else {
            machine.advance_instruction_pointer();
            Ok(())
        }
    }
}

/// `goto_on` / `gosub_on`: jumps to the pointer selected by the value.
struct OnTable(Transfer);

impl SpecialCase for OnTable {
    fn parse_as_expressions(&self) -> bool {
        true
    }

    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        parsed: &[ExpressionPiece],
    ) -> Result<(), VmError> {
        let value = condition(machine, parsed)?;
        let target = usize::try_from(value)
            .ok()
            .and_then(|index| instruction.pointer(index));

        match target {
            Some(target) => self.0.to(machine, target),
            None => {
                trace!(value, pointers = instruction.pointer_count(), "no pointer, falling through");
                machine.advance_instruction_pointer();
                Ok(())
            }
        }
    }
}

/// Index of the first case matching the value. Cases are `( expr )`, and
/// `()` matches anything.
///
/// # Errors
/// If a case is not parenthesized, does not parse, or nothing matches.
pub fn evaluate_case(
    machine: &mut Machine,
    instruction: &Instruction,
    value: i32,
) -> Result<usize, VmError> {
    for index in 0..instruction.case_count() {
        let case = instruction.case(index).unwrap_or_default();
        let inner = case
            .strip_prefix(b"(")
            .and_then(|rest| rest.strip_suffix(b")"))
            .ok_or(ParseError::MalformedCase { index })?;

        if inner.is_empty() {
            return Ok(index);
        }

        let expression = parse_token(inner, get_expression)?;
        if machine.int_value(&expression)? == value {
            return Ok(index);
        }
    }

    Err(ParseError::NoDefaultCase.into())
}

/// `goto_case` / `gosub_case`
struct CaseTable(Transfer);

impl SpecialCase for CaseTable {
    fn parse_as_expressions(&self) -> bool {
        true
    }

    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        parsed: &[ExpressionPiece],
    ) -> Result<(), VmError> {
        let value = condition(machine, parsed)?;
        let index = evaluate_case(machine, instruction, value)?;

        match instruction.pointer(index) {
            Some(target) => self.0.to(machine, target),
            None => {
                trace!(index, "case has no pointer, falling through");
                machine.advance_instruction_pointer();
                Ok(())
            }
        }
    }
}

/// Splits evaluated `*_with` arguments into integers and strings.
#[must_use]
pub fn split_with_arguments(arguments: Vec<Overload2<i32, String>>) -> (Vec<i32>, Vec<String>) {
    let mut integers = Vec::new();
    let mut strings = Vec::new();
    for argument in arguments {
        match argument {
            Overload2::First(value) => integers.push(value),
            Overload2::Second(value) => strings.push(value),
        }
    }
    (integers, strings)
}

/// `gosub_with`: arguments are evaluated before the call and written to the
/// callee's intL/strK after it.
struct GosubWith;

impl SpecialCase for GosubWith {
    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        parsed: &[ExpressionPiece],
    ) -> Result<(), VmError> {
        let mut position = 0;
        let arguments = WithArguments::extract(machine, parsed, &mut position)?;
        let (integers, strings) = split_with_arguments(arguments);

        machine.gosub(instruction.required_pointer(0)?)?;
        machine.set_call_arguments(&integers, &strings);
        Ok(())
    }
}

fn jump_opcodes(module: &mut Module) -> Result<(), RegistrationError> {
    module.add_opcode(
        11,
        0,
        "jump",
        Box::new(
            Opcode::<(IntConstant,), _>::new(|machine, (scenario,)| machine.jump(scenario, 0))
                .without_advance(),
        ),
    )?;
    module.add_opcode(
        11,
        1,
        "jump",
        Box::new(
            Opcode::<(IntConstant, IntConstant), _>::new(|machine, (scenario, entrypoint)| {
                machine.jump(scenario, entrypoint)
            })
            .without_advance(),
        ),
    )?;
    module.add_opcode(
        12,
        0,
        "farcall",
        Box::new(
            Opcode::<(IntConstant,), _>::new(|machine, (scenario,)| machine.farcall(scenario, 0))
                .without_advance(),
        ),
    )?;
    module.add_opcode(
        12,
        1,
        "farcall",
        Box::new(
            Opcode::<(IntConstant, IntConstant), _>::new(|machine, (scenario, entrypoint)| {
                machine.farcall(scenario, entrypoint)
            })
            .without_advance(),
        ),
    )?;
    module.add_opcode(
        18,
        0,
        "farcall_with",
        Box::new(
            Opcode::<(IntConstant, IntConstant, WithArguments), _>::new(
                |machine, (scenario, entrypoint, arguments)| {
                    let (integers, strings) = split_with_arguments(arguments);
                    machine.farcall(scenario, entrypoint)?;
                    machine.set_call_arguments(&integers, &strings);
                    Ok(())
                },
            )
            .without_advance(),
        ),
    )
}

fn ret() -> Box<dyn Operation> {
    opcode::<(), _>(|machine, ()| machine.return_from_gosub())
}

fn rtl() -> Box<dyn Operation> {
    opcode::<(), _>(|machine, ()| machine.return_from_farcall())
}

fn ret_with_value() -> Box<dyn Operation> {
    opcode::<(IntConstant,), _>(|machine, (value,)| {
        machine.return_from_gosub()?;
        machine.set_store_register(value);
        Ok(())
    })
}

fn rtl_with_value() -> Box<dyn Operation> {
    opcode::<(IntConstant,), _>(|machine, (value,)| {
        machine.return_from_farcall()?;
        machine.set_store_register(value);
        Ok(())
    })
}

/// Everything both modules register the same way.
fn shared_opcodes(module: &mut Module) -> Result<(), RegistrationError> {
    module.add_opcode(
        2,
        0,
        "goto_unless",
        special_case(Conditional {
            transfer: Transfer::Goto,
            jump_when: false,
        }),
    )?;
    module.add_opcode(3, 0, "goto_on", special_case(OnTable(Transfer::Goto)))?;
    module.add_opcode(4, 0, "goto_case", special_case(CaseTable(Transfer::Goto)))?;
    module.add_opcode(5, 0, "gosub", special_case(Unconditional(Transfer::Gosub)))?;
    module.add_opcode(
        6,
        0,
        "gosub_if",
        special_case(Conditional {
            transfer: Transfer::Gosub,
            jump_when: true,
        }),
    )?;
    module.add_opcode(
        7,
        0,
        "gosub_unless",
        special_case(Conditional {
            transfer: Transfer::Gosub,
            jump_when: false,
        }),
    )?;
    module.add_opcode(8, 0, "gosub_on", special_case(OnTable(Transfer::Gosub)))?;
    module.add_opcode(9, 0, "gosub_case", special_case(CaseTable(Transfer::Gosub)))?;
    module.add_opcode(10, 0, "ret", ret())?;
    jump_opcodes(module)?;
    module.add_opcode(13, 0, "rtl", rtl())?;
    module.add_opcode(16, 0, "gosub_with", special_case(GosubWith))?;
    module.add_opcode(
        101,
        0,
        "pushStringValueUp",
        opcode::<(IntConstant, StrConstant), _>(|machine, (index, value)| {
            machine.push_string_value_up(index, &value)
        }),
    )
}

fn goto_if() -> Box<dyn Operation> {
    special_case(Conditional {
        transfer: Transfer::Goto,
        jump_when: true,
    })
}

fn goto() -> Box<dyn Operation> {
    special_case(Unconditional(Transfer::Goto))
}

/// # Errors
/// Only on duplicate registration.
pub fn jmp_module() -> Result<Module, RegistrationError> {
    let mut module = Module::new(JMP_MODULE.0, JMP_MODULE.1, "Jmp");
    module.add_opcode(0, 0, "goto", goto())?;
    module.add_opcode(1, 0, "goto_if", goto_if())?;
    shared_opcodes(&mut module)?;
    module.add_opcode(17, 0, "ret_with", ret_with_value())?;
    module.add_opcode(17, 1, "ret_with", ret())?;
    module.add_opcode(19, 0, "rtl_with", rtl_with_value())?;
    module.add_opcode(19, 1, "rtl_with", rtl())?;
    Ok(module)
}

/// # Errors
/// Only on duplicate registration.
pub fn bra_module() -> Result<Module, RegistrationError> {
    let mut module = Module::new(BRA_MODULE.0, BRA_MODULE.1, "Bra");
    module.add_opcode(0, 0, "goto_if", goto_if())?;
    module.add_opcode(1, 0, "goto", goto())?;
    shared_opcodes(&mut module)?;
    module.add_opcode(17, 0, "ret_with", ret())?;
    module.add_opcode(19, 0, "rtl_with", rtl())?;
    Ok(module)
}
