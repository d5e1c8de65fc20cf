/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use vnscript_bytecode::encode;
use vnscript_bytecode::prelude::*;
use vnscript_vm::adapter::{child_mapper, range_mapper, undo_mapper};
use vnscript_vm::module::OperationMapper;
use vnscript_vm::prelude::*;

const TYPE: u8 = 1;
const NUMBER: u8 = 30;

fn instruction(opcode: u16, parameters: Vec<Vec<u8>>) -> Instruction {
    Instruction::new(OpcodeIdentity::new(TYPE, NUMBER, opcode, 0), parameters)
}

fn machine_with(instructions: Vec<Instruction>, module: Module) -> Machine {
    let mut scenario = Scenario::new(0);
    for instruction in instructions {
        scenario.push(instruction);
    }
    let mut archive = Archive::new();
    archive.add(scenario);
    let mut machine = Machine::new(archive, MachineSetup::default()).unwrap();
    machine.attach_module(module).unwrap();
    machine
}

fn int_a(machine: &Machine, index: i32) -> i32 {
    machine
        .memory()
        .int(IntMemRef::new(IntBank::A, index))
        .unwrap()
}

fn a(index: i32) -> IntLocation {
    IntLocation::Memory(IntMemRef::new(IntBank::A, index))
}

/// `intA[object] = value`
fn set_object() -> Box<dyn Operation> {
    opcode::<(IntConstant, IntConstant), _>(|machine, (object, value)| {
        machine.write_int(a(object), value)
    })
}

#[test_log::test]
fn range_adapter_runs_once_per_object() {
    let mut module = Module::mapped(TYPE, NUMBER, "ObjRange", range_mapper);
    module.add_opcode(0, 0, "objSet", set_object()).unwrap();

    let mut machine = machine_with(
        vec![instruction(
            0,
            vec![
                encode::int_constant(2),
                encode::int_constant(4),
                encode::int_constant(7),
            ],
        )],
        module,
    );

    machine.execute_next_instruction().unwrap();

    assert_eq!(int_a(&machine, 1), 0);
    assert_eq!(int_a(&machine, 2), 7);
    assert_eq!(int_a(&machine, 3), 7);
    assert_eq!(int_a(&machine, 4), 7);
    assert_eq!(int_a(&machine, 5), 0);
    assert_eq!(machine.pc().index, 1);
}

/// `objSet` that leaves the instruction pointer where it is.
fn set_object_in_place() -> Box<dyn Operation> {
    Box::new(
        Opcode::<(IntConstant, IntConstant), _>::new(|machine, (object, value)| {
            machine.write_int(a(object), value)
        })
        .without_advance(),
    )
}

#[test_log::test]
fn adapters_keep_the_inner_pointer_policy() {
    // each mapper with the number of selector tokens it takes up front
    let mappers: [(&str, OperationMapper, usize); 3] = [
        ("ObjRange", range_mapper, 2),
        ("ChildObj", child_mapper, 1),
        ("Grp", undo_mapper, 0),
    ];

    for (name, mapper, selectors) in mappers {
        let mut module = Module::mapped(TYPE, NUMBER, name, mapper);
        module.add_opcode(0, 0, "objSet", set_object_in_place()).unwrap();

        let mut tokens = vec![encode::int_constant(1); selectors];
        tokens.extend([encode::int_constant(1), encode::int_constant(6)]);
        let mut machine = machine_with(vec![instruction(0, tokens)], module);

        machine.execute_next_instruction().unwrap();
        assert_eq!(int_a(&machine, 1), 6, "{name}");
        assert_eq!(machine.pc().index, 0, "{name}");
    }
}

#[test_log::test]
fn range_adapter_needs_two_selectors() {
    let mut module = Module::mapped(TYPE, NUMBER, "ObjRange", range_mapper);
    module.add_opcode(0, 0, "objSet", set_object()).unwrap();
    let mut machine = machine_with(vec![instruction(0, vec![encode::int_constant(2)])], module);

    let err = machine.execute_next_instruction().unwrap_err();
    assert!(matches!(
        err.root(),
        VmError::Parse(ParseError::MissingParameter { .. })
    ));
}

#[test_log::test]
fn child_adapter_exposes_the_parent() {
    let mut module = Module::mapped(TYPE, NUMBER, "ChildObj", child_mapper);
    module
        .add_opcode(
            0,
            0,
            "objSet",
            opcode::<(IntConstant, IntConstant), _>(|machine, (object, value)| {
                let parent = machine.parent_object().unwrap_or(-1);
                machine.write_int(a(object), value + parent * 100)
            }),
        )
        .unwrap();

    let mut machine = machine_with(
        vec![instruction(
            0,
            vec![
                encode::int_constant(3),
                encode::int_constant(1),
                encode::int_constant(5),
            ],
        )],
        module,
    );

    machine.execute_next_instruction().unwrap();
    assert_eq!(int_a(&machine, 1), 305);
    assert_eq!(machine.parent_object(), None);
    assert_eq!(machine.pc().index, 1);
}

#[test_log::test]
fn undo_adapter_records_evaluated_parameters() {
    let mut module = Module::mapped(TYPE, NUMBER, "Grp", undo_mapper);
    module.add_opcode(0, 0, "grpSet", set_object()).unwrap();

    // grpSet(intA[10], intA[10] + 1) with intA[10] = 4
    let index = encode::memory_reference(0, 10);
    let mut value = encode::memory_reference(0, 10);
    value.extend_from_slice(b"\\\x00");
    value.extend(encode::int_constant(1));

    let mut machine = machine_with(vec![instruction(0, vec![index, value])], module);
    machine.write_int(a(10), 4).unwrap();

    machine.execute_next_instruction().unwrap();
    assert_eq!(int_a(&machine, 4), 5);

    assert_eq!(
        machine.undo_stack(),
        &[UndoEntry {
            identity: OpcodeIdentity::new(TYPE, NUMBER, 0, 0),
            parameters: vec![encode::int_constant(4), encode::int_constant(5)],
        }]
    );
}

#[test_log::test]
fn replay_does_not_record_or_advance() {
    let mut module = Module::mapped(TYPE, NUMBER, "Grp", undo_mapper);
    module.add_opcode(0, 0, "grpSet", set_object()).unwrap();
    let mut machine = machine_with(
        vec![instruction(0, vec![encode::int_constant(1), encode::int_constant(8)])],
        module,
    );

    machine.execute_next_instruction().unwrap();
    machine.write_int(a(1), 0).unwrap();
    let pc = machine.pc();

    machine.replay_undo_stack().unwrap();

    assert_eq!(int_a(&machine, 1), 8);
    assert_eq!(machine.undo_stack().len(), 1);
    assert_eq!(machine.pc(), pc);
    assert!(!machine.replaying_graphics_stack());
}

#[test_log::test]
fn multi_dispatch_applies_each_list() {
    let mut module = Module::new(TYPE, NUMBER, "Multi");
    module
        .add_opcode(
            0,
            0,
            "setMany",
            Box::new(MultiDispatch::new(set_object())),
        )
        .unwrap();

    let mut machine = machine_with(
        vec![instruction(
            0,
            vec![
                encode::complex(&[encode::int_constant(1), encode::int_constant(11)]),
                encode::complex(&[encode::int_constant(2), encode::int_constant(22)]),
            ],
        )],
        module,
    );

    machine.execute_next_instruction().unwrap();
    assert_eq!(int_a(&machine, 1), 11);
    assert_eq!(int_a(&machine, 2), 22);
    assert_eq!(machine.pc().index, 1);
}
