/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::bank::{bank_debug_name, is_string_location};
use std::fmt::{Display, Formatter};

pub mod op {
    pub const ADD: u8 = 0x00;
    pub const SUB: u8 = 0x01;
    pub const MUL: u8 = 0x02;
    pub const DIV: u8 = 0x03;
    pub const MOD: u8 = 0x04;
    pub const AND: u8 = 0x05;
    pub const OR: u8 = 0x06;
    pub const XOR: u8 = 0x07;
    pub const SHL: u8 = 0x08;
    pub const SHR: u8 = 0x09;

    /// `+=` through `>>=` are the arithmetic codes offset by this amount.
    pub const ASSIGN_OFFSET: u8 = 20;
    pub const ASSIGN: u8 = 30;

    pub const EQUAL: u8 = 40;
    pub const NOT_EQUAL: u8 = 41;
    pub const LESS_OR_EQUAL: u8 = 42;
    pub const LESS: u8 = 43;
    pub const GREATER_OR_EQUAL: u8 = 44;
    pub const GREATER: u8 = 45;

    pub const LOGICAL_AND: u8 = 60;
    pub const LOGICAL_OR: u8 = 61;

    #[must_use]
    pub const fn is_assignment(operation: u8) -> bool {
        operation >= ASSIGN_OFFSET && operation <= ASSIGN
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    String,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
        }
    }
}

/// A parsed parameter or sub expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionPiece {
    StoreRegister,
    IntConstant(i32),
    StrConstant(String),
    MemoryReference {
        bank: u8,
        location: Box<ExpressionPiece>,
    },
    Unary {
        operation: u8,
        operand: Box<ExpressionPiece>,
    },
    Binary {
        operation: u8,
        lhs: Box<ExpressionPiece>,
        rhs: Box<ExpressionPiece>,
    },
    /// `( ... )` list of pieces.
    Complex(Vec<ExpressionPiece>),
    /// `a<tag>` tagged payload.
    Special {
        tag: i32,
        pieces: Vec<ExpressionPiece>,
    },
}

impl ExpressionPiece {
    #[must_use]
    pub fn memory_reference(bank: u8, location: Self) -> Self {
        Self::MemoryReference {
            bank,
            location: Box::new(location),
        }
    }

    #[must_use]
    pub fn unary(operation: u8, operand: Self) -> Self {
        Self::Unary {
            operation,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn binary(operation: u8, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            operation,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::StrConstant(_) => ValueType::String,
            Self::MemoryReference { bank, .. } if is_string_location(*bank) => ValueType::String,
            _ => ValueType::Integer,
        }
    }

    #[must_use]
    pub const fn is_memory_reference(&self) -> bool {
        matches!(self, Self::StoreRegister | Self::MemoryReference { .. })
    }

    #[must_use]
    pub const fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(self, Self::Special { .. })
    }

    /// Pieces nested in a complex or special parameter.
    #[must_use]
    pub fn contained_pieces(&self) -> &[Self] {
        match self {
            Self::Complex(pieces) | Self::Special { pieces, .. } => pieces,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn overload_tag(&self) -> Option<i32> {
        match self {
            Self::Special { tag, .. } => Some(*tag),
            _ => None,
        }
    }
}

#[must_use]
pub const fn perform_unary(operation: u8, value: i32) -> i32 {
    if operation == op::SUB {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Applies an operator code. Division and modulo by zero leave `lhs`
/// untouched. Assignment codes use their arithmetic counterpart.
#[must_use]
pub const fn perform_binary(operation: u8, lhs: i32, rhs: i32) -> i32 {
    let operation = if operation >= op::ASSIGN_OFFSET && operation < op::ASSIGN {
        operation - op::ASSIGN_OFFSET
    } else {
        operation
    };

    match operation {
        op::ADD => lhs.wrapping_add(rhs),
        op::SUB => lhs.wrapping_sub(rhs),
        op::MUL => lhs.wrapping_mul(rhs),
        op::DIV => {
            if rhs == 0 {
                lhs
            } else {
                lhs.wrapping_div(rhs)
            }
        }
        op::MOD => {
            if rhs == 0 {
                lhs
            } else {
                lhs.wrapping_rem(rhs)
            }
        }
        op::AND => lhs & rhs,
        op::OR => lhs | rhs,
        op::XOR => lhs ^ rhs,
        op::SHL => lhs.wrapping_shl(rhs as u32),
        op::SHR => lhs.wrapping_shr(rhs as u32),
        op::ASSIGN => rhs,
        op::EQUAL => (lhs == rhs) as i32,
        op::NOT_EQUAL => (lhs != rhs) as i32,
        op::LESS_OR_EQUAL => (lhs <= rhs) as i32,
        op::LESS => (lhs < rhs) as i32,
        op::GREATER_OR_EQUAL => (lhs >= rhs) as i32,
        op::GREATER => (lhs > rhs) as i32,
        op::LOGICAL_AND => (lhs != 0 && rhs != 0) as i32,
        op::LOGICAL_OR => (lhs != 0 || rhs != 0) as i32,
        _ => 0,
    }
}

const fn operator_symbol(operation: u8) -> &'static str {
    match operation {
        0 | 20 => "+",
        1 | 21 => "-",
        2 | 22 => "*",
        3 | 23 => "/",
        4 | 24 => "%",
        5 | 25 => "&",
        6 | 26 => "|",
        7 | 27 => "^",
        8 | 28 => "<<",
        9 | 29 => ">>",
        30 => "=",
        40 => "==",
        41 => "!=",
        42 => "<=",
        43 => "<",
        44 => ">=",
        45 => ">",
        60 => "&&",
        61 => "||",
        _ => "?",
    }
}

impl Display for ExpressionPiece {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreRegister => write!(f, "<store>"),
            Self::IntConstant(value) => write!(f, "{value}"),
            Self::StrConstant(value) => write!(f, "\"{value}\""),
            Self::MemoryReference { bank, location } => {
                write!(f, "{}[{location}]", bank_debug_name(*bank))
            }
            Self::Unary { operation, operand } => {
                if *operation == op::SUB {
                    write!(f, "-")?;
                }
                write!(f, "{operand}")
            }
            Self::Binary {
                operation,
                lhs,
                rhs,
            } => {
                let symbol = operator_symbol(*operation);
                if (op::ASSIGN_OFFSET..op::ASSIGN).contains(operation) {
                    write!(f, "{lhs} {symbol}= {rhs}")
                } else {
                    write!(f, "{lhs} {symbol} {rhs}")
                }
            }
            Self::Complex(pieces) => {
                write!(f, "(")?;
                for piece in pieces {
                    write!(f, "({piece})")?;
                }
                write!(f, ")")
            }
            Self::Special { tag, pieces } => {
                write!(f, "{tag}:{{")?;
                for (index, piece) in pieces.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{piece}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
