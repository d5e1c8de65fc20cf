/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */

//! Executable instruction handlers.
//!
//! [`Opcode`] and [`StoreOpcode`] thread a descriptor tuple across the raw
//! tokens and call a typed handler. [`SpecialCaseOp`] hands the raw
//! instruction to hand written code (branches, case tables), and
//! [`UndefinedFunction`] marks opcodes that are known but not supported.

use crate::Machine;
use crate::error::VmError;
use crate::module::ModuleId;
use crate::param::ParamList;
use seq_map::SeqMap;
use std::marker::PhantomData;
use vnscript_bytecode::parse::{get_data, get_expression, parse_token};
use vnscript_bytecode::prelude::{ExpressionPiece, Instruction, OpcodeIdentity};

/// Small `int -> int` property bag.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: SeqMap<i32, i32>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: i32) -> Option<i32> {
        self.values.get(&key).copied()
    }

    pub fn set(&mut self, key: i32, value: i32) {
        if let Some(existing) = self.values.get_mut(&key) {
            *existing = value;
        } else {
            let _ = self.values.insert(key, value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }
}

/// What an operation knows about the module that owns it. Handed over at
/// registration instead of a live back reference.
#[derive(Debug, Clone)]
pub struct OwningModule {
    pub id: ModuleId,
    pub name: String,
    pub defaults: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    pub name: String,
    pub properties: Properties,
    pub module: Option<OwningModule>,
}

pub trait Operation {
    fn info(&self) -> &OperationInfo;

    fn info_mut(&mut self) -> &mut OperationInfo;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.info_mut().name);
    }

    fn attach(&mut self, module: OwningModule) {
        self.info_mut().module = Some(module);
    }

    fn module(&self) -> Option<&OwningModule> {
        self.info().module.as_ref()
    }

    /// Own property first, then the owning module's default.
    fn property(&self, key: i32) -> Option<i32> {
        let info = self.info();
        info.properties
            .get(key)
            .or_else(|| info.module.as_ref().and_then(|m| m.defaults.get(key)))
    }

    fn set_property(&mut self, key: i32, value: i32) {
        self.info_mut().properties.set(key, value);
    }

    /// # Errors
    /// If the tokens do not match what the operation expects.
    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError>;

    /// # Errors
    /// Whatever the handler reports.
    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError>;

    /// Jumps, calls and returns manage the instruction pointer themselves.
    fn advance_ip(&self) -> bool {
        true
    }

    /// Parses (once per instruction), dispatches and advances.
    ///
    /// # Errors
    /// Parse errors and whatever the handler reports.
    fn dispatch_function(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
    ) -> Result<(), VmError> {
        let parsed = instruction.parsed_parameters_or_parse(|tokens| self.parse_parameters(tokens))?;
        self.dispatch(machine, parsed)?;
        if self.advance_ip() {
            machine.advance_instruction_pointer();
        }
        Ok(())
    }
}

fn parse_list<P: ParamList>(tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
    let mut position = 0;
    let mut output = Vec::with_capacity(tokens.len());
    P::parse_all(tokens, &mut position, &mut output)?;
    Ok(output)
}

/// Typed handler over the descriptor tuple `P`.
pub struct Opcode<P, F> {
    info: OperationInfo,
    handler: F,
    advance: bool,
    params: PhantomData<fn() -> P>,
}

impl<P, F> Opcode<P, F>
where
    P: ParamList,
    F: Fn(&mut Machine, P::Values) -> Result<(), VmError>,
{
    pub fn new(handler: F) -> Self {
        Self {
            info: OperationInfo::default(),
            handler,
            advance: true,
            params: PhantomData,
        }
    }

    /// For handlers that move the instruction pointer themselves.
    #[must_use]
    pub fn without_advance(mut self) -> Self {
        self.advance = false;
        self
    }
}

impl<P, F> Operation for Opcode<P, F>
where
    P: ParamList,
    F: Fn(&mut Machine, P::Values) -> Result<(), VmError>,
{
    fn info(&self) -> &OperationInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        &mut self.info
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        parse_list::<P>(tokens)
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        let mut position = 0;
        let values = P::extract_all(machine, parsed, &mut position)?;
        (self.handler)(machine, values)
    }

    fn advance_ip(&self) -> bool {
        self.advance
    }
}

/// Like [`Opcode`], but the handler's result lands in the store register.
pub struct StoreOpcode<P, F> {
    info: OperationInfo,
    handler: F,
    params: PhantomData<fn() -> P>,
}

impl<P, F> StoreOpcode<P, F>
where
    P: ParamList,
    F: Fn(&mut Machine, P::Values) -> Result<i32, VmError>,
{
    pub fn new(handler: F) -> Self {
        Self {
            info: OperationInfo::default(),
            handler,
            params: PhantomData,
        }
    }
}

impl<P, F> Operation for StoreOpcode<P, F>
where
    P: ParamList,
    F: Fn(&mut Machine, P::Values) -> Result<i32, VmError>,
{
    fn info(&self) -> &OperationInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        &mut self.info
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        parse_list::<P>(tokens)
    }

    fn dispatch(&self, machine: &mut Machine, parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        let mut position = 0;
        let values = P::extract_all(machine, parsed, &mut position)?;
        let value = (self.handler)(machine, values)?;
        machine.set_store_register(value);
        Ok(())
    }
}

/// Hand written handling of a raw instruction.
pub trait SpecialCase {
    /// Parse the tokens as evaluable expressions instead of plain data.
    fn parse_as_expressions(&self) -> bool {
        false
    }

    /// Responsible for moving the instruction pointer.
    ///
    /// # Errors
    /// Whatever the handler reports.
    fn call(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
        parsed: &[ExpressionPiece],
    ) -> Result<(), VmError>;
}

pub struct SpecialCaseOp<S> {
    info: OperationInfo,
    case: S,
}

impl<S: SpecialCase> SpecialCaseOp<S> {
    pub fn new(case: S) -> Self {
        Self {
            info: OperationInfo::default(),
            case,
        }
    }
}

impl<S: SpecialCase> Operation for SpecialCaseOp<S> {
    fn info(&self) -> &OperationInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        &mut self.info
    }

    fn parse_parameters(&self, tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        let parser = if self.case.parse_as_expressions() {
            get_expression
        } else {
            get_data
        };
        tokens
            .iter()
            .map(|token| parse_token(token, parser).map_err(VmError::from))
            .collect()
    }

    fn dispatch(&self, _machine: &mut Machine, _parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        Err(VmError::Handler(format!(
            "{} needs the whole instruction and can only be called through dispatch_function",
            self.name()
        )))
    }

    fn advance_ip(&self) -> bool {
        false
    }

    fn dispatch_function(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
    ) -> Result<(), VmError> {
        let parsed = instruction.parsed_parameters_or_parse(|tokens| self.parse_parameters(tokens))?;
        self.case.call(machine, instruction, parsed)
    }
}

/// Placeholder for an opcode that is known but not supported. Fails at the
/// first entry point that is reached.
pub struct UndefinedFunction {
    info: OperationInfo,
    identity: OpcodeIdentity,
}

impl UndefinedFunction {
    #[must_use]
    pub fn new(identity: OpcodeIdentity) -> Self {
        Self {
            info: OperationInfo::default(),
            identity,
        }
    }

    fn unsupported(&self) -> VmError {
        VmError::Unsupported {
            name: self.name().to_string(),
            identity: self.identity,
        }
    }
}

impl Operation for UndefinedFunction {
    fn info(&self) -> &OperationInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut OperationInfo {
        &mut self.info
    }

    fn parse_parameters(&self, _tokens: &[Vec<u8>]) -> Result<Vec<ExpressionPiece>, VmError> {
        Err(self.unsupported())
    }

    fn dispatch(&self, _machine: &mut Machine, _parsed: &[ExpressionPiece]) -> Result<(), VmError> {
        Err(self.unsupported())
    }

    fn dispatch_function(
        &self,
        _machine: &mut Machine,
        _instruction: &Instruction,
    ) -> Result<(), VmError> {
        Err(self.unsupported())
    }
}

pub fn opcode<P, F>(handler: F) -> Box<dyn Operation>
where
    P: ParamList + 'static,
    F: Fn(&mut Machine, P::Values) -> Result<(), VmError> + 'static,
{
    Box::new(Opcode::<P, F>::new(handler))
}

pub fn store_opcode<P, F>(handler: F) -> Box<dyn Operation>
where
    P: ParamList + 'static,
    F: Fn(&mut Machine, P::Values) -> Result<i32, VmError> + 'static,
{
    Box::new(StoreOpcode::<P, F>::new(handler))
}

pub fn special_case<S: SpecialCase + 'static>(case: S) -> Box<dyn Operation> {
    Box::new(SpecialCaseOp::new(case))
}
