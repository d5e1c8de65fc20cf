/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::error::ParseError;
use crate::expression::ExpressionPiece;
use crate::parse::get_data;
use crate::printable::parsable_to_printable;
use std::cell::OnceCell;
use std::fmt::{Display, Formatter};
use tracing::trace;

/// Full identity of an opcode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OpcodeIdentity {
    pub module_type: u8,
    pub module: u8,
    pub opcode: u16,
    pub overload: u8,
}

impl OpcodeIdentity {
    #[must_use]
    pub const fn new(module_type: u8, module: u8, opcode: u16, overload: u8) -> Self {
        Self {
            module_type,
            module,
            opcode,
            overload,
        }
    }
}

impl Display for OpcodeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "opcode<{}:{}:{}, {}>",
            self.module_type, self.module, self.opcode, self.overload
        )
    }
}

/// A decoded command. Everything except the parsed parameter cache is
/// immutable after construction.
#[derive(Debug, Clone)]
pub struct Instruction {
    identity: OpcodeIdentity,
    line: u32,
    parameters: Vec<Vec<u8>>,
    pointers: Vec<usize>,
    cases: Vec<Vec<u8>>,
    parsed: OnceCell<Vec<ExpressionPiece>>,
}

impl Instruction {
    #[must_use]
    pub const fn new(identity: OpcodeIdentity, parameters: Vec<Vec<u8>>) -> Self {
        Self {
            identity,
            line: 0,
            parameters,
            pointers: Vec::new(),
            cases: Vec::new(),
            parsed: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Branch targets, as instruction indices in the owning scenario.
    #[must_use]
    pub fn with_pointers(mut self, pointers: Vec<usize>) -> Self {
        self.pointers = pointers;
        self
    }

    /// Raw case tokens for `goto_case`/`gosub_case`, parallel to the pointers.
    #[must_use]
    pub fn with_cases(mut self, cases: Vec<Vec<u8>>) -> Self {
        self.cases = cases;
        self
    }

    #[must_use]
    pub const fn identity(&self) -> OpcodeIdentity {
        self.identity
    }

    #[must_use]
    pub const fn module_type(&self) -> u8 {
        self.identity.module_type
    }

    #[must_use]
    pub const fn module(&self) -> u8 {
        self.identity.module
    }

    #[must_use]
    pub const fn opcode(&self) -> u16 {
        self.identity.opcode
    }

    #[must_use]
    pub const fn overload(&self) -> u8 {
        self.identity.overload
    }

    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn unparsed_parameters(&self) -> &[Vec<u8>] {
        &self.parameters
    }

    #[must_use]
    pub fn parameters_are_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    #[must_use]
    pub fn parsed_parameters(&self) -> Option<&[ExpressionPiece]> {
        self.parsed.get().map(Vec::as_slice)
    }

    /// Stores the parsed parameters. The first stored value wins.
    pub fn set_parsed_parameters(&self, parsed: Vec<ExpressionPiece>) {
        let _ = self.parsed.set(parsed);
    }

    /// Returns the cached parameters, parsing them with `parse` the first
    /// time.
    ///
    /// # Errors
    /// Whatever `parse` reports. Nothing is cached on failure.
    pub fn parsed_parameters_or_parse<E>(
        &self,
        parse: impl FnOnce(&[Vec<u8>]) -> Result<Vec<ExpressionPiece>, E>,
    ) -> Result<&[ExpressionPiece], E> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = parse(&self.parameters)?;
        trace!(identity = %self.identity, count = parsed.len(), "parsed parameters");
        Ok(self.parsed.get_or_init(|| parsed))
    }

    #[must_use]
    pub fn pointer(&self, index: usize) -> Option<usize> {
        self.pointers.get(index).copied()
    }

    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    #[must_use]
    pub fn case(&self, index: usize) -> Option<&[u8]> {
        self.cases.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// # Errors
    /// If the instruction carries fewer pointers than `index + 1`.
    pub fn required_pointer(&self, index: usize) -> Result<usize, ParseError> {
        self.pointer(index)
            .ok_or(ParseError::MissingPointer { index })
    }

    /// `(a, b, ...)` with each raw parameter shown as its debug form, or as
    /// `{RAW : <hex>}` when it does not parse.
    #[must_use]
    pub fn parameter_debug_string(&self) -> String {
        let rendered: Vec<String> = self
            .parameters
            .iter()
            .map(|token| {
                let mut src = token.as_slice();
                match get_data(&mut src) {
                    Ok(piece) => piece.to_string(),
                    Err(_) => format!("{{RAW : {}}}", parsable_to_printable(token)),
                }
            })
            .collect();

        format!("({})", rendered.join(", "))
    }
}
