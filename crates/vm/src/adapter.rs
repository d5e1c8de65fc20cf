/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */

//! Operation wrappers that add the same behavior to a whole module. Use
//! them through [`crate::module::Module::mapped`] with the matching
//! `*_mapper` function.

use crate::error::VmError;
use crate::operation::{Operation, OperationInfo};
use crate::{Machine, UndoEntry};
use tracing::trace;
use vnscript_bytecode::encode;
use vnscript_bytecode::parse::{get_complex_param, get_expression, parse_token};
use vnscript_bytecode::prelude::{ExpressionPiece, Instruction, ParseError};

/// Records each successful dispatch on the machine's undo stack so
/// graphics state can be rebuilt by replaying it.
pub struct UndoAdapter {
    inner: Box<dyn Operation>,
}

impl UndoAdapter {
    #[must_use]
    pub fn new(inner: Box<dyn Operation>) -> Self {
        Self { inner }
    }
}

#[must_use]
pub fn undo_mapper(inner: Box<dyn Operation>) -> Box<dyn Operation> {
    Box::new(UndoAdapter::new(inner))
}

impl Operation for UndoAdapter {
    fn info(&self) -> &OperationInfo {
        self.inner.info()
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        self.inner.info_mut()
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        self.inner.parse_parameters(tokens)
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        self.inner.dispatch(machine, parsed)
    }

    fn advance_ip(&self) -> bool {
        self.inner.advance_ip()
    }

    fn dispatch_function(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
    ) -> Result<(), VmError> {
        // Values are captured before the dispatch can change them.
        let parameters = if machine.replaying_graphics_stack() {
            None
        } else {
            let parsed =
                instruction.parsed_parameters_or_parse(|tokens| self.parse_parameters(tokens))?;
            Some(
                parsed
                    .iter()
                    .map(|piece| machine.serialize(piece))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };

        self.inner.dispatch_function(machine, instruction)?;

        if let Some(parameters) = parameters {
            trace!(name = self.name(), "recording undo entry");
            machine.push_undo(UndoEntry {
                identity: instruction.identity(),
                parameters,
            });
        }
        Ok(())
    }
}

/// Takes two leading selectors `lo, hi` and runs the inner operation once
/// per object number in `lo..=hi`, with the number as its first parameter.
pub struct RangeAdapter {
    inner: Box<dyn Operation>,
}

impl RangeAdapter {
    #[must_use]
    pub fn new(inner: Box<dyn Operation>) -> Self {
        Self { inner }
    }
}

#[must_use]
pub fn range_mapper(inner: Box<dyn Operation>) -> Box<dyn Operation> {
    Box::new(RangeAdapter::new(inner))
}

impl Operation for RangeAdapter {
    fn info(&self) -> &OperationInfo {
        self.inner.info()
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        self.inner.info_mut()
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        if tokens.len() < 2 {
            return Err(ParseError::MissingParameter {
                descriptor: "RangeAdapter",
                position: tokens.len(),
            }
            .into());
        }

        let lo = parse_token(&tokens[0], get_expression)?;
        let hi = parse_token(&tokens[1], get_expression)?;

        // The inner operation sees a placeholder object number up front.
        let mut inner_tokens = Vec::with_capacity(tokens.len() - 1);
        inner_tokens.push(encode::int_constant(0));
        inner_tokens.extend_from_slice(&tokens[2..]);
        let inner = self.inner.parse_parameters(&inner_tokens)?;

        let mut parsed = vec![lo, hi];
        parsed.extend(inner.into_iter().skip(1));
        Ok(parsed)
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        let [lo, hi, rest @ ..] = parsed else {
            return Err(VmError::IllegalPosition {
                descriptor: "RangeAdapter",
                position: 2,
                len: parsed.len(),
            });
        };
        let lo = machine.int_value(lo)?;
        let hi = machine.int_value(hi)?;

        let mut arguments = Vec::with_capacity(parsed.len() - 1);
        for object in lo..=hi {
            arguments.clear();
            arguments.push(ExpressionPiece::IntConstant(object));
            arguments.extend_from_slice(rest);
            self.inner.dispatch(machine, &arguments)?;
        }
        Ok(())
    }

    fn advance_ip(&self) -> bool {
        self.inner.advance_ip()
    }
}

/// Takes one leading parent object number and exposes it through
/// [`Machine::parent_object`] while the inner operation runs.
pub struct ChildAdapter {
    inner: Box<dyn Operation>,
}

impl ChildAdapter {
    #[must_use]
    pub fn new(inner: Box<dyn Operation>) -> Self {
        Self { inner }
    }
}

#[must_use]
pub fn child_mapper(inner: Box<dyn Operation>) -> Box<dyn Operation> {
    Box::new(ChildAdapter::new(inner))
}

impl Operation for ChildAdapter {
    fn info(&self) -> &OperationInfo {
        self.inner.info()
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        self.inner.info_mut()
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        let Some((parent, rest)) = tokens.split_first() else {
            return Err(ParseError::MissingParameter {
                descriptor: "ChildAdapter",
                position: 0,
            }
            .into());
        };

        let mut parsed = vec![parse_token(parent, get_expression)?];
        parsed.extend(self.inner.parse_parameters(rest)?);
        Ok(parsed)
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        let Some((parent, rest)) = parsed.split_first() else {
            return Err(VmError::IllegalPosition {
                descriptor: "ChildAdapter",
                position: 0,
                len: 0,
            });
        };
        let parent = machine.int_value(parent)?;

        let previous = machine.set_parent_object(Some(parent));
        let result = self.inner.dispatch(machine, rest);
        machine.set_parent_object(previous);
        result
    }

    fn advance_ip(&self) -> bool {
        self.inner.advance_ip()
    }
}

/// Runs the inner operation once per `( ... )` parameter. A bare parameter
/// counts as a list of one.
pub struct MultiDispatch {
    info: OperationInfo,
    inner: Box<dyn Operation>,
}

impl MultiDispatch {
    #[must_use]
    pub fn new(inner: Box<dyn Operation>) -> Self {
        Self {
            info: OperationInfo::default(),
            inner,
        }
    }
}

impl Operation for MultiDispatch {
    fn info(&self) -> &OperationInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        &mut self.info
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        tokens
            .iter()
            .map(|token| -> Result<ExpressionPiece, VmError> {
                let piece = parse_token(token, get_complex_param)?;
                Ok(if piece.is_complex() {
                    piece
                } else {
                    ExpressionPiece::Complex(vec![piece])
                })
            })
            .collect()
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        for list in parsed {
            self.inner.dispatch(machine, list.contained_pieces())?;
        }
        Ok(())
    }

    fn advance_ip(&self) -> bool {
        self.inner.advance_ip()
    }
}
