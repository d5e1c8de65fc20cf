/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use vnscript_bytecode::bank::{INTL_LOCATION, STORE_REGISTER_LOCATION, STRK_LOCATION};
use vnscript_bytecode::encode;
use vnscript_bytecode::parse::get_assignment;
use vnscript_bytecode::prelude::*;
use vnscript_vm::memory::{INT_BANK_SIZE, LOCAL_INT_SIZE, STR_BANK_SIZE};
use vnscript_vm::prelude::*;

fn machine() -> Machine {
    let mut archive = Archive::new();
    archive.add(Scenario::new(0));
    Machine::new(archive, MachineSetup::default()).unwrap()
}

fn expression(bytes: &[u8]) -> ExpressionPiece {
    get_expression(&mut &bytes[..]).unwrap()
}

#[test_log::test]
fn packed_bit_access() {
    let mut memory = Memory::new();
    let bit = |index| IntMemRef::with_width(IntBank::B, AccessWidth::Bit1, index);

    memory.set_int(bit(0), 1).unwrap();
    memory.set_int(bit(3), 1).unwrap();
    memory.set_int(bit(33), 1).unwrap();

    assert_eq!(memory.int(IntMemRef::new(IntBank::B, 0)).unwrap(), 0b1001);
    assert_eq!(memory.int(IntMemRef::new(IntBank::B, 1)).unwrap(), 0b10);
    assert_eq!(memory.int(bit(3)).unwrap(), 1);
    assert_eq!(memory.int(bit(2)).unwrap(), 0);
}

#[test_log::test]
fn packed_writes_keep_only_low_bits() {
    let mut memory = Memory::new();
    let nibble = |index| IntMemRef::with_width(IntBank::C, AccessWidth::Bit4, index);

    memory.set_int(nibble(1), 0x1F).unwrap();
    assert_eq!(memory.int(nibble(1)).unwrap(), 0xF);
    assert_eq!(memory.int(nibble(0)).unwrap(), 0);
    assert_eq!(memory.int(IntMemRef::new(IntBank::C, 0)).unwrap(), 0xF0);
}

#[test_log::test]
fn packed_bounds_scale_with_width() {
    let memory = Memory::new();
    let last_byte = IntMemRef::with_width(IntBank::A, AccessWidth::Bit8, (INT_BANK_SIZE * 4 - 1) as i32);
    assert!(memory.int(last_byte).is_ok());

    let past = IntMemRef::with_width(IntBank::A, AccessWidth::Bit8, (INT_BANK_SIZE * 4) as i32);
    assert!(matches!(
        memory.int(past),
        Err(VmError::InvalidMemoryAccess { .. })
    ));
}

#[test_log::test]
fn local_bank_bounds() {
    let mut memory = Memory::new();
    assert!(memory.set_int(IntMemRef::new(IntBank::L, (LOCAL_INT_SIZE - 1) as i32), 1).is_ok());
    assert!(memory.set_int(IntMemRef::new(IntBank::L, LOCAL_INT_SIZE as i32), 1).is_err());
    assert!(memory.set_int(IntMemRef::new(IntBank::L, -1), 1).is_err());
}

#[test_log::test]
fn str_k_grows_on_write() {
    let mut memory = Memory::new();
    assert_eq!(memory.string(StrMemRef::new(StrBank::K, 7)).unwrap(), "");
    assert!(memory.local.str_k.is_empty());

    memory.set_string(StrMemRef::new(StrBank::K, 7), "x").unwrap();
    assert_eq!(memory.local.str_k.len(), 8);
    assert_eq!(memory.string(StrMemRef::new(StrBank::K, 7)).unwrap(), "x");
    assert_eq!(memory.string(StrMemRef::new(StrBank::K, 3)).unwrap(), "");

    let past_the_bank = StrMemRef::new(StrBank::K, STR_BANK_SIZE as i32);
    assert!(memory.set_string(past_the_bank, "x").is_err());
    assert!(memory.string(past_the_bank).is_err());
    assert!(memory.set_string(StrMemRef::new(StrBank::K, -1), "x").is_err());
}

#[test_log::test]
fn width_comes_from_the_bank_id() {
    // 26 * 2 + 1 = intB2b
    let reference = IntMemRef::from_bytecode(53, 7).unwrap();
    assert_eq!(reference.bank, IntBank::B);
    assert_eq!(reference.width, AccessWidth::Bit2);
    assert_eq!(reference.to_string(), "intB2b[7]");
}

#[test_log::test]
fn assignment_writes_back() {
    let mut machine = machine();
    let mut bytes = encode::memory_reference(INTL_LOCATION, 0);
    bytes.extend_from_slice(b"\\\x1e");
    bytes.extend(encode::int_constant(6));
    let assign = get_assignment(&mut &bytes[..]).unwrap();

    assert_eq!(machine.int_value(&assign).unwrap(), 6);

    let mut bytes = encode::memory_reference(INTL_LOCATION, 0);
    bytes.extend_from_slice(b"\\\x16");
    bytes.extend(encode::int_constant(7));
    let multiply = get_assignment(&mut &bytes[..]).unwrap();

    assert_eq!(machine.int_value(&multiply).unwrap(), 42);
    assert_eq!(
        machine.memory().int(IntMemRef::new(IntBank::L, 0)).unwrap(),
        42
    );
}

#[test_log::test]
fn division_by_zero_keeps_the_left_operand() {
    let mut machine = machine();
    let mut bytes = encode::int_constant(9);
    bytes.extend_from_slice(b"\\\x03");
    bytes.extend(encode::int_constant(0));
    assert_eq!(machine.int_value(&expression(&bytes)).unwrap(), 9);
}

#[test_log::test]
fn store_register_is_an_int_location() {
    let mut machine = machine();
    let store = expression(&[b'$', STORE_REGISTER_LOCATION]);

    machine.set_int_value(&store, 12).unwrap();
    assert_eq!(machine.store_register(), 12);
    assert_eq!(machine.int_value(&store).unwrap(), 12);
}

#[test_log::test]
fn string_values() {
    let mut machine = machine();
    let slot = expression(&encode::memory_reference(STRK_LOCATION, 1));

    machine.set_string_value(&slot, "abc").unwrap();
    assert_eq!(machine.string_value(&slot).unwrap(), "abc");
    assert!(matches!(
        machine.int_value(&slot),
        Err(VmError::NotAnInteger { .. })
    ));
}

#[test_log::test]
fn serialize_keeps_structure() {
    let mut machine = machine();
    machine
        .write_int(IntLocation::Memory(IntMemRef::new(IntBank::A, 2)), 31)
        .unwrap();

    let piece = ExpressionPiece::Complex(vec![
        ExpressionPiece::memory_reference(0, ExpressionPiece::IntConstant(2)),
        ExpressionPiece::StrConstant("hi".to_string()),
    ]);
    assert_eq!(
        machine.serialize(&piece).unwrap(),
        encode::complex(&[encode::int_constant(31), encode::string("hi")])
    );

    let special = ExpressionPiece::Special {
        tag: 1,
        pieces: vec![ExpressionPiece::StrConstant("s".to_string())],
    };
    assert_eq!(
        machine.serialize(&special).unwrap(),
        encode::special(1, &[encode::string("s")])
    );
}
