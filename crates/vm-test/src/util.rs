/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use tracing::debug;
use vnscript_bytecode::bank::{INTL_LOCATION, STRK_LOCATION};
use vnscript_bytecode::encode;
use vnscript_bytecode::prelude::{
    Archive, Instruction, IntBank, IntMemRef, OpcodeIdentity, Scenario, StrBank, StrMemRef,
};
use vnscript_modules::prelude::{BRA_MODULE, JMP_MODULE, register_standard_modules};
use vnscript_vm::prelude::*;

/// Module used by the tests for simple memory writes.
pub const TEST_MODULE: (u8, u8) = (1, 99);

pub const SET_INT: u16 = 0;
pub const SET_STR: u16 = 1;
pub const ADD_INT: u16 = 2;

fn identity(module: (u8, u8), opcode: u16, overload: u8) -> OpcodeIdentity {
    OpcodeIdentity::new(module.0, module.1, opcode, overload)
}

#[must_use]
pub fn jmp(opcode: u16, overload: u8, parameters: Vec<Vec<u8>>) -> Instruction {
    Instruction::new(identity(JMP_MODULE, opcode, overload), parameters)
}

#[must_use]
pub fn bra(opcode: u16, overload: u8, parameters: Vec<Vec<u8>>) -> Instruction {
    Instruction::new(identity(BRA_MODULE, opcode, overload), parameters)
}

#[must_use]
pub fn goto(target: usize) -> Instruction {
    jmp(0, 0, vec![]).with_pointers(vec![target])
}

#[must_use]
pub fn gosub(target: usize) -> Instruction {
    jmp(5, 0, vec![]).with_pointers(vec![target])
}

#[must_use]
pub fn ret() -> Instruction {
    jmp(10, 0, vec![])
}

#[must_use]
pub fn rtl() -> Instruction {
    jmp(13, 0, vec![])
}

/// `intA[index] = value`
#[must_use]
pub fn set_int(index: i32, value: i32) -> Instruction {
    set_int_to(index, encode::int_constant(value))
}

/// `intA[index] = <expression>`
#[must_use]
pub fn set_int_to(index: i32, expression: Vec<u8>) -> Instruction {
    Instruction::new(
        identity(TEST_MODULE, SET_INT, 0),
        vec![encode::int_constant(index), expression],
    )
}

/// `intA[index] += value`
#[must_use]
pub fn add_int(index: i32, value: i32) -> Instruction {
    Instruction::new(
        identity(TEST_MODULE, ADD_INT, 0),
        vec![encode::int_constant(index), encode::int_constant(value)],
    )
}

/// `strS[index] = value`
#[must_use]
pub fn set_str(index: i32, value: &str) -> Instruction {
    set_str_to(index, encode::string(value))
}

/// `strS[index] = <string expression>`
#[must_use]
pub fn set_str_to(index: i32, expression: Vec<u8>) -> Instruction {
    Instruction::new(
        identity(TEST_MODULE, SET_STR, 0),
        vec![encode::int_constant(index), expression],
    )
}

#[must_use]
pub fn local_int(index: i32) -> Vec<u8> {
    encode::memory_reference(INTL_LOCATION, index)
}

/// Integer argument of a `*_with` call.
#[must_use]
pub fn with_int(value: i32) -> Vec<u8> {
    encode::special(0, &[encode::int_constant(value)])
}

/// String argument of a `*_with` call.
#[must_use]
pub fn with_str(value: &str) -> Vec<u8> {
    encode::special(1, &[encode::string(value)])
}

#[must_use]
pub fn local_string(index: i32) -> Vec<u8> {
    encode::memory_reference(STRK_LOCATION, index)
}

/// # Panics
/// Never, the opcodes are distinct.
#[must_use]
pub fn test_module() -> Module {
    let mut module = Module::new(TEST_MODULE.0, TEST_MODULE.1, "Test");
    module
        .add_opcode(
            SET_INT,
            0,
            "setInt",
            opcode::<(IntConstant, IntConstant), _>(|machine, (index, value)| {
                machine.write_int(IntLocation::Memory(IntMemRef::new(IntBank::A, index)), value)
            }),
        )
        .unwrap();
    module
        .add_opcode(
            SET_STR,
            0,
            "setStr",
            opcode::<(IntConstant, StrConstant), _>(|machine, (index, value)| {
                machine.write_string(StrMemRef::new(StrBank::S, index), &value)
            }),
        )
        .unwrap();
    module
        .add_opcode(
            ADD_INT,
            0,
            "addInt",
            opcode::<(IntConstant, IntConstant), _>(|machine, (index, value)| {
                let location = IntLocation::Memory(IntMemRef::new(IntBank::A, index));
                let current = machine.read_int(location)?;
                machine.write_int(location, current + value)
            }),
        )
        .unwrap();
    module
}

#[must_use]
pub fn scenario(id: u16, instructions: Vec<Instruction>) -> Scenario {
    let mut scenario = Scenario::new(id);
    for instruction in instructions {
        scenario.push(instruction);
    }
    scenario
}

/// Machine starting at scenario `0` of `scenarios`, with the standard and
/// test modules attached.
///
/// # Panics
/// If scenario `0` is missing.
#[must_use]
pub fn machine_with(scenarios: Vec<Scenario>) -> Machine {
    let mut archive = Archive::new();
    for scenario in scenarios {
        archive.add(scenario);
    }
    let mut machine = Machine::new(archive, MachineSetup::default()).unwrap();
    register_standard_modules(&mut machine).unwrap();
    machine.attach_module(test_module()).unwrap();
    machine
}

#[must_use]
pub fn single(instructions: Vec<Instruction>) -> Machine {
    machine_with(vec![scenario(0, instructions)])
}

/// Runs to the end, failing the test on the first error.
pub fn run(machine: &mut Machine) -> usize {
    match machine.run(1000) {
        Ok(steps) => {
            debug!(steps, pc = ?machine.pc(), "run finished");
            steps
        }
        Err(err) => {
            eprintln!("{}", hexify::format_hex(&int_a_bytes(machine, 16)));
            panic!("machine failed at {:?}: {err}", machine.pc());
        }
    }
}

/// # Panics
/// If `index` is outside intA.
#[must_use]
pub fn int_a(machine: &Machine, index: i32) -> i32 {
    machine
        .memory()
        .int(IntMemRef::new(IntBank::A, index))
        .unwrap()
}

/// # Panics
/// If `index` is outside strS.
#[must_use]
pub fn str_s(machine: &Machine, index: i32) -> String {
    machine
        .memory()
        .string(StrMemRef::new(StrBank::S, index))
        .unwrap()
        .to_string()
}

/// The first `count` intA cells as little endian bytes.
#[must_use]
pub fn int_a_bytes(machine: &Machine, count: i32) -> Vec<u8> {
    (0..count)
        .flat_map(|index| {
            machine
                .memory()
                .int(IntMemRef::new(IntBank::A, index))
                .unwrap_or_default()
                .to_le_bytes()
        })
        .collect()
}
