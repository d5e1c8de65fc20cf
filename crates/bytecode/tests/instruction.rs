/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use std::cell::Cell;
use vnscript_bytecode::bank::{STRK_LOCATION, STRS_LOCATION, is_string_location};
use vnscript_bytecode::encode;
use vnscript_bytecode::prelude::*;

#[test_log::test]
fn parsed_parameters_are_cached() {
    let instruction = Instruction::new(
        OpcodeIdentity::new(1, 2, 3, 0),
        vec![encode::int_constant(4)],
    );
    assert!(!instruction.parameters_are_parsed());

    let calls = Cell::new(0);
    let parse = |tokens: &[Vec<u8>]| -> Result<Vec<ExpressionPiece>, ParseError> {
        calls.set(calls.get() + 1);
        tokens
            .iter()
            .map(|token| get_data(&mut token.as_slice()))
            .collect()
    };

    let first = instruction.parsed_parameters_or_parse(parse).unwrap().to_vec();
    let second = instruction.parsed_parameters_or_parse(parse).unwrap().to_vec();

    assert_eq!(calls.get(), 1);
    assert_eq!(first, second);
    assert!(instruction.parameters_are_parsed());
}

#[test_log::test]
fn failed_parse_is_not_cached() {
    let instruction = Instruction::new(OpcodeIdentity::new(0, 1, 0, 0), vec![b"$\xFF".to_vec()]);
    let result = instruction.parsed_parameters_or_parse(|tokens| {
        tokens
            .iter()
            .map(|token| get_expression(&mut token.as_slice()))
            .collect::<Result<Vec<_>, _>>()
    });
    assert!(result.is_err());
    assert!(!instruction.parameters_are_parsed());
}

#[test_log::test]
fn parameter_debug_string() {
    let instruction = Instruction::new(
        OpcodeIdentity::new(1, 10, 0, 0),
        vec![
            encode::int_constant(1),
            encode::string("x"),
            encode::memory_reference(STRK_LOCATION, 2),
            b"$\x05".to_vec(),
        ],
    );
    assert_eq!(
        instruction.parameter_debug_string(),
        "(1, \"x\", strK[2], {RAW : $ 05})"
    );
}

#[test_log::test]
fn identity_display() {
    assert_eq!(
        OpcodeIdentity::new(1, 4, 300, 2).to_string(),
        "opcode<1:4:300, 2>"
    );
}

#[test_log::test]
fn pointers_and_cases() {
    let instruction = Instruction::new(OpcodeIdentity::new(0, 1, 4, 0), vec![])
        .with_pointers(vec![3, 7])
        .with_cases(vec![b"($\xFF\x01\x00\x00\x00)".to_vec(), b"()".to_vec()])
        .with_line(12);

    assert_eq!(instruction.pointer_count(), 2);
    assert_eq!(instruction.pointer(1), Some(7));
    assert_eq!(instruction.pointer(2), None);
    assert_eq!(instruction.required_pointer(2), Err(ParseError::MissingPointer { index: 2 }));
    assert_eq!(instruction.case_count(), 2);
    assert_eq!(instruction.case(1), Some(b"()".as_slice()));
    assert_eq!(instruction.line(), 12);
}

#[test_log::test]
fn scenario_entrypoints() {
    let mut scenario = Scenario::new(9);
    scenario.push(Instruction::new(OpcodeIdentity::new(0, 1, 10, 0), vec![]));
    let second = scenario.push(Instruction::new(OpcodeIdentity::new(0, 1, 10, 0), vec![]));

    assert_eq!(scenario.entrypoint(0), Some(0));
    assert_eq!(scenario.entrypoint(5), None);

    scenario.add_entrypoint(5, second).unwrap();
    assert_eq!(scenario.entrypoint(5), Some(1));
    assert_eq!(
        scenario.add_entrypoint(5, 0),
        Err(ParseError::DuplicateEntrypoint { entrypoint: 5 })
    );

    let mut archive = Archive::new();
    archive.add(scenario);
    assert_eq!(archive.scenario(9).map(|s| s.len()), Some(2));
    assert!(archive.scenario(10).is_none());
}

#[test_log::test]
fn bank_ids() {
    let reference = IntMemRef::from_bytecode(2 * 26 + 1, 7).unwrap();
    assert_eq!(reference.bank, IntBank::B);
    assert_eq!(reference.width, AccessWidth::Bit2);
    assert_eq!(reference.bytecode_id(), 2 * 26 + 1);
    assert_eq!(reference.to_string(), "intB2b[7]");

    assert_eq!(IntMemRef::from_bytecode(11, 0).unwrap().bank, IntBank::L);
    assert_eq!(IntMemRef::from_bytecode(25, 0).unwrap().bank, IntBank::Z);
    assert!(IntMemRef::from_bytecode(8, 0).is_none());
    assert!(IntMemRef::from_bytecode(5 * 26, 0).is_none());

    assert!(is_string_location(STRS_LOCATION));
    assert_eq!(
        StrMemRef::from_bytecode(STRK_LOCATION, 2).unwrap().to_string(),
        "strK[2]"
    );
}
