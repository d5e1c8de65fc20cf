/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use vnscript_bytecode::expression::{op, perform_binary};
use vnscript_bytecode::parse::{get_assignment, parse_token};
use vnscript_bytecode::prelude::*;

fn expression(printable: &str) -> ExpressionPiece {
    let bytes = printable_to_parsable(printable).unwrap();
    parse_token(&bytes, get_expression).unwrap()
}

#[test_log::test]
fn int_constant() {
    assert_eq!(
        expression("$ FF 01 00 00 00"),
        ExpressionPiece::IntConstant(1)
    );
    assert_eq!(
        expression("$ FF FF FF FF FF"),
        ExpressionPiece::IntConstant(-1)
    );
}

#[test_log::test]
fn store_register() {
    assert_eq!(expression("$ C8"), ExpressionPiece::StoreRegister);
}

#[test_log::test]
fn memory_reference() {
    let piece = expression("$ 00 [ $ FF 05 00 00 00 ]");
    assert!(piece.is_memory_reference());
    assert_eq!(piece.value_type(), ValueType::Integer);
    assert_eq!(piece.to_string(), "intA[5]");

    let string_piece = expression("$ 12 [ $ FF 02 00 00 00 ]");
    assert_eq!(string_piece.value_type(), ValueType::String);
    assert_eq!(string_piece.to_string(), "strS[2]");
}

#[test_log::test]
fn multiplication_binds_tighter_than_addition() {
    let piece = expression("$ FF 01 00 00 00 5c 00 $ FF 02 00 00 00 5c 02 $ FF 03 00 00 00");
    assert_eq!(
        piece,
        ExpressionPiece::binary(
            op::ADD,
            ExpressionPiece::IntConstant(1),
            ExpressionPiece::binary(
                op::MUL,
                ExpressionPiece::IntConstant(2),
                ExpressionPiece::IntConstant(3)
            )
        )
    );
    assert_eq!(piece.to_string(), "1 + 2 * 3");
}

#[test_log::test]
fn subtraction_is_left_associative() {
    let piece = expression("$ FF 0A 00 00 00 5c 01 $ FF 02 00 00 00 5c 01 $ FF 03 00 00 00");
    assert_eq!(piece.to_string(), "10 - 2 - 3");
    let ExpressionPiece::Binary { lhs, .. } = piece else {
        panic!("expected binary");
    };
    assert_eq!(lhs.to_string(), "10 - 2");
}

#[test_log::test]
fn conditions_and_booleans() {
    let piece = expression("$ FF 01 00 00 00 5c 28 $ FF 01 00 00 00 5c 3c $ FF 02 00 00 00 5c 2b $ FF 03 00 00 00");
    assert_eq!(piece.to_string(), "1 == 1 && 2 < 3");
    let ExpressionPiece::Binary { operation, .. } = piece else {
        panic!("expected binary");
    };
    assert_eq!(operation, op::LOGICAL_AND);
}

#[test_log::test]
fn unary_minus_and_parens() {
    assert_eq!(expression("5c 01 $ FF 05 00 00 00").to_string(), "-5");
    assert_eq!(
        expression("( $ FF 01 00 00 00 5c 00 $ FF 02 00 00 00 ) 5c 02 $ FF 03 00 00 00").to_string(),
        "1 + 2 * 3"
    );
}

#[test_log::test]
fn truncated_constant_is_an_error() {
    let bytes = printable_to_parsable("$ FF 01").unwrap();
    assert!(matches!(
        parse_token(&bytes, get_expression),
        Err(ParseError::UnexpectedEnd { .. })
    ));
}

#[test_log::test]
fn missing_close_bracket_is_an_error() {
    let bytes = printable_to_parsable("$ 00 [ $ FF 05 00 00 00").unwrap();
    assert!(parse_token(&bytes, get_expression).is_err());
}

#[test_log::test]
fn assignment() {
    let bytes = printable_to_parsable("$ 00 [ $ FF 00 00 00 00 ] 5c 14 $ FF 02 00 00 00").unwrap();
    let piece = parse_token(&bytes, get_assignment).unwrap();
    assert_eq!(piece.to_string(), "intA[0] += 2");

    let bad = printable_to_parsable("$ 00 [ $ FF 00 00 00 00 ] 5c 02 $ FF 02 00 00 00").unwrap();
    assert_eq!(
        parse_token(&bad, get_assignment),
        Err(ParseError::UndefinedAssignment { operation: 0x02 })
    );
}

#[test_log::test]
fn quoted_and_unquoted_strings() {
    assert_eq!(
        parse_token(b"\"string one\"", get_data).unwrap(),
        ExpressionPiece::StrConstant("string one".to_string())
    );
    assert_eq!(
        parse_token(b"ABC_1", get_data).unwrap(),
        ExpressionPiece::StrConstant("ABC_1".to_string())
    );
    assert_eq!(
        parse_token(b"\"say \\\"hi\\\"\"", get_data).unwrap(),
        ExpressionPiece::StrConstant("say \"hi\"".to_string())
    );
}

#[test_log::test]
fn special_parameters() {
    let piece = parse_token(b"a\x00$\xFF\x07\x00\x00\x00", get_data).unwrap();
    assert_eq!(
        piece,
        ExpressionPiece::Special {
            tag: 0,
            pieces: vec![ExpressionPiece::IntConstant(7)]
        }
    );

    let list = parse_token(b"a\x02($\xFF\x01\x00\x00\x00\"x\")", get_data).unwrap();
    assert_eq!(list.overload_tag(), Some(2));
    assert_eq!(list.contained_pieces().len(), 2);

    let double_tag = parse_token(b"a\x01a\x03\"y\"", get_data).unwrap();
    assert_eq!(double_tag.overload_tag(), Some((3 << 16) | 1));
}

#[test_log::test]
fn complex_parameters() {
    let bytes = printable_to_parsable("( $ FF 01 00 00 00 $ FF 02 00 00 00 )").unwrap();
    let piece = parse_token(&bytes, get_complex_param).unwrap();
    assert!(piece.is_complex());
    assert_eq!(
        piece.contained_pieces(),
        &[ExpressionPiece::IntConstant(1), ExpressionPiece::IntConstant(2)]
    );
    assert_eq!(piece.to_string(), "((1)(2))");
}

#[test_log::test]
fn printable_conversion() {
    assert_eq!(
        parsable_to_printable(b"$\xFF\x01\x00\x00\x00"),
        "$ ff 01 00 00 00"
    );
    assert_eq!(
        printable_to_parsable("$ ff 01 00 00 00").unwrap(),
        b"$\xFF\x01\x00\x00\x00".to_vec()
    );
    assert!(matches!(
        printable_to_parsable("$ FFF"),
        Err(ParseError::InvalidPrintable(_))
    ));
    assert!(printable_to_parsable("zz").is_err());
}

#[test_log::test]
fn binary_operators() {
    assert_eq!(perform_binary(op::DIV, 7, 0), 7);
    assert_eq!(perform_binary(op::MOD, 7, 0), 7);
    assert_eq!(perform_binary(op::DIV, 7, 2), 3);
    assert_eq!(perform_binary(op::SHL, 1, 4), 16);
    assert_eq!(perform_binary(op::ASSIGN_OFFSET + op::MUL, 3, 4), 12);
    assert_eq!(perform_binary(op::GREATER_OR_EQUAL, 3, 3), 1);
    assert_eq!(perform_binary(op::LOGICAL_OR, 0, 0), 0);
}
