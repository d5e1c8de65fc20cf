/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */

//! Recursive descent parser for raw parameter tokens.
//!
//! Every function takes the remaining input as `&mut &[u8]` and advances it
//! past whatever it consumed.

use crate::bank::{INT_CONSTANT_LOCATION, STORE_REGISTER_LOCATION};
use crate::error::ParseError;
use crate::expression::{ExpressionPiece, op};

const ESCAPE: u8 = b'\\';

const CONDITION_FIRST: u8 = 0x28;
const CONDITION_LAST: u8 = 0x2D;
const AND_MARKER: u8 = b'<';
const OR_MARKER: u8 = b'=';

/// Bytecode condition codes start at 0x28, the evaluator uses 40.
const CONDITION_BASE: u8 = op::EQUAL;

fn peek(src: &[u8], offset: usize) -> Option<u8> {
    src.get(offset).copied()
}

fn advance(src: &mut &[u8], count: usize) {
    *src = &src[count.min(src.len())..];
}

fn expect(src: &mut &[u8], wanted: u8, context: &'static str) -> Result<(), ParseError> {
    match peek(src, 0) {
        Some(byte) if byte == wanted => {
            advance(src, 1);
            Ok(())
        }
        Some(byte) => Err(ParseError::UnexpectedByte {
            byte,
            context,
            expected: Some(wanted as char),
        }),
        None => Err(ParseError::UnexpectedEnd { context }),
    }
}

fn is_operator(src: &[u8], accept: impl Fn(u8) -> bool) -> Option<u8> {
    if peek(src, 0) == Some(ESCAPE) {
        peek(src, 1).filter(|code| accept(*code))
    } else {
        None
    }
}

/// Two byte Shift-JIS lead bytes.
const fn is_double_byte_lead(byte: u8) -> bool {
    matches!(byte, 0x81..=0x9F | 0xE0..=0xEF)
}

const fn starts_string(byte: u8) -> bool {
    is_double_byte_lead(byte)
        || byte.is_ascii_uppercase()
        || byte.is_ascii_digit()
        || matches!(byte, b' ' | b'?' | b'_' | b'"')
}

const fn continues_unquoted_string(byte: u8) -> bool {
    starts_string(byte) || byte.is_ascii_lowercase()
}

fn get_expression_token(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    const CONTEXT: &str = "expression token";
    let first = peek(src, 0).ok_or(ParseError::UnexpectedEnd { context: CONTEXT })?;

    match first {
        INT_CONSTANT_LOCATION => {
            if src.len() < 5 {
                return Err(ParseError::UnexpectedEnd { context: CONTEXT });
            }
            let value = i32::from_le_bytes([src[1], src[2], src[3], src[4]]);
            advance(src, 5);
            Ok(ExpressionPiece::IntConstant(value))
        }
        STORE_REGISTER_LOCATION => {
            advance(src, 1);
            Ok(ExpressionPiece::StoreRegister)
        }
        bank if peek(src, 1) == Some(b'[') => {
            advance(src, 2);
            let location = get_expression(src)?;
            expect(src, b']', CONTEXT)?;
            Ok(ExpressionPiece::memory_reference(bank, location))
        }
        byte => Err(ParseError::UnexpectedByte {
            byte,
            context: CONTEXT,
            expected: None,
        }),
    }
}

fn get_expression_term(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    const CONTEXT: &str = "expression term";
    match (peek(src, 0), peek(src, 1)) {
        (Some(b'$'), _) => {
            advance(src, 1);
            get_expression_token(src)
        }
        (Some(ESCAPE), Some(op::ADD)) => {
            advance(src, 2);
            get_expression_term(src)
        }
        (Some(ESCAPE), Some(op::SUB)) => {
            advance(src, 2);
            Ok(ExpressionPiece::unary(op::SUB, get_expression_term(src)?))
        }
        (Some(b'('), _) => {
            advance(src, 1);
            let inner = get_expression_boolean(src)?;
            expect(src, b')', CONTEXT)?;
            Ok(inner)
        }
        (Some(byte), _) => Err(ParseError::UnexpectedByte {
            byte,
            context: CONTEXT,
            expected: None,
        }),
        (None, _) => Err(ParseError::UnexpectedEnd { context: CONTEXT }),
    }
}

fn get_expression_high_precedence(
    src: &mut &[u8],
    mut lhs: ExpressionPiece,
) -> Result<ExpressionPiece, ParseError> {
    while let Some(operation) = is_operator(src, |code| (op::MUL..=op::SHR).contains(&code)) {
        advance(src, 2);
        let rhs = get_expression_term(src)?;
        lhs = ExpressionPiece::binary(operation, lhs, rhs);
    }
    Ok(lhs)
}

fn get_expression_arithmetic(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    let first = get_expression_term(src)?;
    let mut lhs = get_expression_high_precedence(src, first)?;

    while let Some(operation) = is_operator(src, |code| code == op::ADD || code == op::SUB) {
        advance(src, 2);
        let term = get_expression_term(src)?;
        let rhs = get_expression_high_precedence(src, term)?;
        lhs = ExpressionPiece::binary(operation, lhs, rhs);
    }
    Ok(lhs)
}

fn get_expression_condition(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    let mut lhs = get_expression_arithmetic(src)?;

    while let Some(code) = is_operator(src, |code| (CONDITION_FIRST..=CONDITION_LAST).contains(&code))
    {
        advance(src, 2);
        let rhs = get_expression_arithmetic(src)?;
        lhs = ExpressionPiece::binary(code - CONDITION_FIRST + CONDITION_BASE, lhs, rhs);
    }
    Ok(lhs)
}

fn get_expression_and(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    let mut lhs = get_expression_condition(src)?;

    while is_operator(src, |code| code == AND_MARKER).is_some() {
        advance(src, 2);
        let rhs = get_expression_condition(src)?;
        lhs = ExpressionPiece::binary(op::LOGICAL_AND, lhs, rhs);
    }
    Ok(lhs)
}

fn get_expression_boolean(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    let mut lhs = get_expression_and(src)?;

    while is_operator(src, |code| code == OR_MARKER).is_some() {
        advance(src, 2);
        let rhs = get_expression_and(src)?;
        lhs = ExpressionPiece::binary(op::LOGICAL_OR, lhs, rhs);
    }
    Ok(lhs)
}

/// Parses an integer expression.
///
/// # Errors
/// If the bytes are not a well formed expression.
pub fn get_expression(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    get_expression_boolean(src)
}

/// Parses `<destination> \<op> <expression>`.
///
/// # Errors
/// If the operator is not one of the assignment operators.
pub fn get_assignment(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    let destination = get_expression_term(src)?;
    expect(src, ESCAPE, "assignment")?;
    let operation = peek(src, 0).ok_or(ParseError::UnexpectedEnd {
        context: "assignment",
    })?;
    advance(src, 1);
    let value = get_expression(src)?;

    if op::is_assignment(operation) {
        Ok(ExpressionPiece::binary(operation, destination, value))
    } else {
        Err(ParseError::UndefinedAssignment { operation })
    }
}

fn get_string(src: &mut &[u8]) -> ExpressionPiece {
    let mut output = Vec::new();
    let mut quoted = false;
    let mut index = 0;

    while let Some(byte) = peek(src, index) {
        if quoted {
            if byte == ESCAPE && peek(src, index + 1) == Some(b'"') {
                output.push(b'"');
                index += 2;
                continue;
            }
            if byte == b'"' {
                index += 1;
                break;
            }
            output.push(byte);
            index += 1;
            continue;
        }

        if byte == b'"' {
            quoted = true;
            index += 1;
            continue;
        }
        if !continues_unquoted_string(byte) {
            break;
        }
        if is_double_byte_lead(byte) {
            output.extend_from_slice(&src[index..(index + 2).min(src.len())]);
            index += 2;
        } else {
            output.push(byte);
            index += 1;
        }
    }

    advance(src, index);
    ExpressionPiece::StrConstant(String::from_utf8_lossy(&output).into_owned())
}

fn get_pieces_until_close(
    src: &mut &[u8],
    context: &'static str,
) -> Result<Vec<ExpressionPiece>, ParseError> {
    let mut pieces = Vec::new();
    loop {
        match peek(src, 0) {
            Some(b')') => {
                advance(src, 1);
                return Ok(pieces);
            }
            Some(_) => pieces.push(get_data(src)?),
            None => return Err(ParseError::UnexpectedEnd { context }),
        }
    }
}

fn get_special(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    const CONTEXT: &str = "special parameter";
    advance(src, 1);
    let mut tag = i32::from(peek(src, 0).ok_or(ParseError::UnexpectedEnd { context: CONTEXT })?);
    advance(src, 1);

    if peek(src, 0) == Some(b'a') {
        let second = peek(src, 1).ok_or(ParseError::UnexpectedEnd { context: CONTEXT })?;
        tag |= i32::from(second) << 16;
        advance(src, 2);
    }

    if peek(src, 0) == Some(b'(') {
        advance(src, 1);
        let pieces = get_pieces_until_close(src, CONTEXT)?;
        Ok(ExpressionPiece::Special { tag, pieces })
    } else {
        let piece = get_data(src)?;
        Ok(ExpressionPiece::Special {
            tag,
            pieces: vec![piece],
        })
    }
}

/// Parses one parameter. Handles strings, special parameters and
/// expressions.
///
/// # Errors
/// If the parameter is malformed.
pub fn get_data(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    match peek(src, 0) {
        Some(b',') => {
            advance(src, 1);
            get_data(src)
        }
        // line marker: newline followed by a two byte line number
        Some(b'\n') => {
            advance(src, 3);
            get_data(src)
        }
        Some(byte) if starts_string(byte) => Ok(get_string(src)),
        Some(b'a') => get_special(src),
        _ => get_expression(src),
    }
}

/// Parses a parameter that may be a `( ... )` list.
///
/// # Errors
/// If the parameter is malformed.
pub fn get_complex_param(src: &mut &[u8]) -> Result<ExpressionPiece, ParseError> {
    match peek(src, 0) {
        Some(b',') => {
            advance(src, 1);
            get_data(src)
        }
        Some(b'(') => {
            advance(src, 1);
            let pieces = get_pieces_until_close(src, "complex parameter")?;
            Ok(ExpressionPiece::Complex(pieces))
        }
        _ => get_expression(src),
    }
}

/// Convenience for parsing a whole token with one of the parsers above.
///
/// # Errors
/// Whatever `parser` reports.
pub fn parse_token(
    token: &[u8],
    parser: fn(&mut &[u8]) -> Result<ExpressionPiece, ParseError>,
) -> Result<ExpressionPiece, ParseError> {
    let mut src = token;
    parser(&mut src)
}
