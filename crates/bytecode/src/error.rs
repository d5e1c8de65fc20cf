/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::expression::ValueType;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEnd {
        context: &'static str,
    },
    UnexpectedByte {
        byte: u8,
        context: &'static str,
        expected: Option<char>,
    },
    UndefinedAssignment {
        operation: u8,
    },
    InvalidPrintable(String),
    /// A parameter descriptor found a value of the wrong type.
    TypeMismatch {
        descriptor: &'static str,
        expected: ValueType,
        actual: String,
    },
    /// A complex or special descriptor found a plain value.
    ShapeMismatch {
        descriptor: &'static str,
        actual: String,
    },
    MissingParameter {
        descriptor: &'static str,
        position: usize,
    },
    UnexpectedParameter {
        descriptor: &'static str,
        position: usize,
    },
    MissingPointer {
        index: usize,
    },
    MalformedCase {
        index: usize,
    },
    NoDefaultCase,
    DuplicateEntrypoint {
        entrypoint: i32,
    },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEnd { context } => {
                write!(f, "Unexpected end of buffer in {context}")
            }
            Self::UnexpectedByte {
                byte,
                context,
                expected,
            } => {
                write!(f, "Unexpected byte 0x{byte:02X} in {context}")?;
                if let Some(expected) = expected {
                    write!(f, " ('{expected}' expected)")?;
                }
                Ok(())
            }
            Self::UndefinedAssignment { operation } => {
                write!(f, "Undefined assignment operation 0x{operation:02X}")
            }
            Self::InvalidPrintable(token) => {
                write!(f, "Invalid printable token '{token}'")
            }
            Self::TypeMismatch {
                descriptor,
                expected,
                actual,
            } => write!(
                f,
                "{descriptor} parse error. Expected type {expected}, but actually contained \"{actual}\""
            ),
            Self::ShapeMismatch { descriptor, actual } => write!(
                f,
                "{descriptor} parse error. Expected a parenthesized or tagged parameter, but actually contained \"{actual}\""
            ),
            Self::MissingParameter {
                descriptor,
                position,
            } => write!(f, "{descriptor} expected a parameter at position {position}"),
            Self::UnexpectedParameter {
                descriptor,
                position,
            } => write!(f, "{descriptor} has an extra parameter at position {position}"),
            Self::MissingPointer { index } => write!(f, "Missing branch pointer {index}"),
            Self::MalformedCase { index } => {
                write!(f, "Malformed bytecode in goto_case statement (case {index})")
            }
            Self::NoDefaultCase => write!(f, "Malformed bytecode: no default case"),
            Self::DuplicateEntrypoint { entrypoint } => {
                write!(f, "Duplicate entrypoint {entrypoint}")
            }
        }
    }
}

impl Error for ParseError {}
