/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::error::ParseError;

const LITERALS: &[u8] = b"()$[]";

/// Renders raw token bytes as space separated hex, keeping the structural
/// characters `( ) $ [ ]` readable.
#[must_use]
pub fn parsable_to_printable(src: &[u8]) -> String {
    src.iter()
        .map(|byte| {
            if LITERALS.contains(byte) {
                (*byte as char).to_string()
            } else {
                format!("{byte:02x}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inverse of [`parsable_to_printable`]. Used to write readable test
/// fixtures such as `"$ FF 01 00 00 00"`.
///
/// # Errors
/// If a token is neither a structural character nor a hex byte.
pub fn printable_to_parsable(src: &str) -> Result<Vec<u8>, ParseError> {
    src.split_whitespace()
        .map(|token| match token.as_bytes() {
            [single] if LITERALS.contains(single) => Ok(*single),
            bytes if bytes.len() <= 2 => u8::from_str_radix(token, 16)
                .map_err(|_| ParseError::InvalidPrintable(token.to_string())),
            _ => Err(ParseError::InvalidPrintable(token.to_string())),
        })
        .collect()
}
