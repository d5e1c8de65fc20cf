/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::bank::{INT_CONSTANT_LOCATION, STORE_REGISTER_LOCATION};

#[must_use]
pub fn int_constant(value: i32) -> Vec<u8> {
    let mut bytes = vec![b'$', INT_CONSTANT_LOCATION];
    bytes.extend_from_slice(&value.to_le_bytes());
    bytes
}

#[must_use]
pub fn store_register() -> Vec<u8> {
    vec![b'$', STORE_REGISTER_LOCATION]
}

/// `$ <bank> [ $ FF <index> ]`
#[must_use]
pub fn memory_reference(bank_id: u8, index: i32) -> Vec<u8> {
    let mut bytes = vec![b'$', bank_id, b'['];
    bytes.extend(int_constant(index));
    bytes.push(b']');
    bytes
}

/// Quoted string, escaping embedded quotes.
#[must_use]
pub fn string(value: &str) -> Vec<u8> {
    let mut bytes = vec![b'"'];
    for byte in value.bytes() {
        if byte == b'"' {
            bytes.push(b'\\');
        }
        bytes.push(byte);
    }
    bytes.push(b'"');
    bytes
}

/// `a <tag> [a <tag2>] <payload>`, wrapping multi piece payloads in parens.
/// The second tag byte comes from bits 16..24 of `tag`.
#[must_use]
pub fn special(tag: i32, payload: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = vec![b'a', (tag & 0xFF) as u8];
    let second = (tag >> 16) & 0xFF;
    if second != 0 {
        bytes.extend_from_slice(&[b'a', second as u8]);
    }
    if payload.len() > 1 {
        bytes.push(b'(');
    }
    for piece in payload {
        bytes.extend_from_slice(piece);
    }
    if payload.len() > 1 {
        bytes.push(b')');
    }
    bytes
}

/// `( <piece> ... )`
#[must_use]
pub fn complex(pieces: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = vec![b'('];
    for piece in pieces {
        bytes.extend_from_slice(piece);
    }
    bytes.push(b')');
    bytes
}
