/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::Machine;
use crate::error::VmError;
use crate::memory::IntLocation;
use vnscript_bytecode::bank::is_string_location;
use vnscript_bytecode::encode;
use vnscript_bytecode::expression::{op, perform_binary, perform_unary};
use vnscript_bytecode::prelude::{ExpressionPiece, IntMemRef, StrMemRef, ValueType};

impl Machine {
    /// Evaluates an integer expression. Assignment expressions write their
    /// result back to the left hand side and return it.
    ///
    /// # Errors
    /// If the piece is not integer typed or touches invalid memory.
    pub fn int_value(&mut self, piece: &ExpressionPiece) -> Result<i32, VmError> {
        match piece {
            ExpressionPiece::StoreRegister => Ok(self.store_register()),
            ExpressionPiece::IntConstant(value) => Ok(*value),
            ExpressionPiece::MemoryReference { bank, .. } if !is_string_location(*bank) => {
                let location = self.int_location(piece)?;
                self.read_int(location)
            }
            ExpressionPiece::Unary { operation, operand } => {
                let value = self.int_value(operand)?;
                Ok(perform_unary(*operation, value))
            }
            ExpressionPiece::Binary {
                operation,
                lhs,
                rhs,
            } if op::is_assignment(*operation) => {
                let location = self.int_location(lhs)?;
                let rhs = self.int_value(rhs)?;
                let value = if *operation == op::ASSIGN {
                    rhs
                } else {
                    perform_binary(*operation, self.read_int(location)?, rhs)
                };
                self.write_int(location, value)?;
                Ok(value)
            }
            ExpressionPiece::Binary {
                operation,
                lhs,
                rhs,
            } => {
                let lhs = self.int_value(lhs)?;
                let rhs = self.int_value(rhs)?;
                Ok(perform_binary(*operation, lhs, rhs))
            }
            _ => Err(VmError::NotAnInteger {
                piece: piece.to_string(),
            }),
        }
    }

    /// # Errors
    /// If the piece is not string typed or touches invalid memory.
    pub fn string_value(&mut self, piece: &ExpressionPiece) -> Result<String, VmError> {
        match piece {
            ExpressionPiece::StrConstant(value) => Ok(value.clone()),
            ExpressionPiece::MemoryReference { bank, .. } if is_string_location(*bank) => {
                let location = self.str_location(piece)?;
                self.read_string(location)
            }
            _ => Err(VmError::NotAString {
                piece: piece.to_string(),
            }),
        }
    }

    /// # Errors
    /// If the piece is not a writable integer location.
    pub fn set_int_value(&mut self, piece: &ExpressionPiece, value: i32) -> Result<(), VmError> {
        let location = self.int_location(piece)?;
        self.write_int(location, value)
    }

    /// # Errors
    /// If the piece is not a writable string location.
    pub fn set_string_value(&mut self, piece: &ExpressionPiece, value: &str) -> Result<(), VmError> {
        let location = self.str_location(piece)?;
        self.write_string(location, value)
    }

    /// Resolves the index expression now, so the returned location does not
    /// depend on anything the expression referred to.
    ///
    /// # Errors
    /// If the piece is not an integer memory reference or the store register.
    pub fn int_location(&mut self, piece: &ExpressionPiece) -> Result<IntLocation, VmError> {
        match piece {
            ExpressionPiece::StoreRegister => Ok(IntLocation::StoreRegister),
            ExpressionPiece::MemoryReference { bank, location } if !is_string_location(*bank) => {
                let index = self.int_value(location)?;
                IntMemRef::from_bytecode(*bank, index)
                    .map(IntLocation::Memory)
                    .ok_or_else(|| VmError::InvalidMemoryAccess {
                        location: piece.to_string(),
                    })
            }
            _ => Err(VmError::NotAReference {
                piece: piece.to_string(),
            }),
        }
    }

    /// # Errors
    /// If the piece is not a string memory reference.
    pub fn str_location(&mut self, piece: &ExpressionPiece) -> Result<StrMemRef, VmError> {
        match piece {
            ExpressionPiece::MemoryReference { bank, location } if is_string_location(*bank) => {
                let index = self.int_value(location)?;
                StrMemRef::from_bytecode(*bank, index).ok_or_else(|| {
                    VmError::InvalidMemoryAccess {
                        location: piece.to_string(),
                    }
                })
            }
            _ => Err(VmError::NotAReference {
                piece: piece.to_string(),
            }),
        }
    }

    /// Re-encodes the evaluated value of `piece`, keeping the complex and
    /// special structure around it.
    ///
    /// # Errors
    /// If any contained value can not be evaluated.
    pub fn serialize(&mut self, piece: &ExpressionPiece) -> Result<Vec<u8>, VmError> {
        match piece {
            ExpressionPiece::Complex(pieces) => {
                let inner = self.serialize_all(pieces)?;
                Ok(encode::complex(&inner))
            }
            ExpressionPiece::Special { tag, pieces } => {
                let inner = self.serialize_all(pieces)?;
                Ok(encode::special(*tag, &inner))
            }
            _ if piece.value_type() == ValueType::String => {
                let value = self.string_value(piece)?;
                Ok(encode::string(&value))
            }
            _ => {
                let value = self.int_value(piece)?;
                Ok(encode::int_constant(value))
            }
        }
    }

    fn serialize_all(&mut self, pieces: &[ExpressionPiece]) -> Result<Vec<Vec<u8>>, VmError> {
        pieces.iter().map(|piece| self.serialize(piece)).collect()
    }
}
