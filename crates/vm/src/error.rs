/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::FrameKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use vnscript_bytecode::prelude::{OpcodeIdentity, ParseError};

/// Raised while building modules. Never seen at runtime with correctly
/// authored modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    DuplicateOpcode {
        module: String,
        opcode: u16,
        overload: u8,
    },
    DuplicateModule {
        module: String,
    },
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateOpcode {
                module,
                opcode,
                overload,
            } => write!(
                f,
                "Duplicate opcode in {module}: opcode {opcode}, {overload}"
            ),
            Self::DuplicateModule { module } => write!(f, "Duplicate module {module}"),
        }
    }
}

impl Error for RegistrationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    Parse(ParseError),
    Registration(RegistrationError),
    /// No operation is registered for this identity.
    Unimplemented {
        identity: OpcodeIdentity,
        parameters: String,
    },
    /// The opcode is known but deliberately not supported.
    Unsupported {
        name: String,
        identity: OpcodeIdentity,
    },
    InvalidMemoryAccess {
        location: String,
    },
    NotAnInteger {
        piece: String,
    },
    NotAString {
        piece: String,
    },
    NotAReference {
        piece: String,
    },
    IllegalPosition {
        descriptor: &'static str,
        position: usize,
        len: usize,
    },
    EmptySpecial,
    IllegalOverload {
        tag: i32,
        mapped: i32,
    },
    CallstackMismatch {
        expected: FrameKind,
    },
    CallDepthExceeded {
        depth: usize,
    },
    UnknownScenario {
        scenario: i32,
    },
    UnknownEntrypoint {
        scenario: u16,
        entrypoint: i32,
    },
    InvalidPointer {
        scenario: u16,
        index: usize,
    },
    /// Error raised by an operation, annotated with where it came from.
    InOperation {
        name: String,
        identity: OpcodeIdentity,
        source: Box<VmError>,
    },
    Handler(String),
}

impl VmError {
    #[must_use]
    pub fn in_operation(self, name: &str, identity: OpcodeIdentity) -> Self {
        Self::InOperation {
            name: name.to_string(),
            identity,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping operation annotations.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InOperation { source, .. } => source.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_unimplemented(&self) -> bool {
        matches!(self.root(), Self::Unimplemented { .. })
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Registration(err) => write!(f, "{err}"),
            Self::Unimplemented {
                identity,
                parameters,
            } => write!(f, "Undefined: {identity}{parameters}"),
            Self::Unsupported { name, identity } => {
                write!(f, "Unsupported: {name} ({identity})")
            }
            Self::InvalidMemoryAccess { location } => {
                write!(f, "Invalid memory access {location}")
            }
            Self::NotAnInteger { piece } => write!(f, "{piece} is not an integer value"),
            Self::NotAString { piece } => write!(f, "{piece} is not a string value"),
            Self::NotAReference { piece } => write!(f, "{piece} is not a memory reference"),
            Self::IllegalPosition {
                descriptor,
                position,
                len,
            } => write!(f, "Illegal position in {descriptor}: {position} (size {len})"),
            Self::EmptySpecial => write!(f, "Empty special construct"),
            Self::IllegalOverload { tag, mapped } => write!(
                f,
                "Illegal overload in special parameter. Bytecode tag was {tag}, mapped position was {mapped}"
            ),
            Self::CallstackMismatch { expected } => {
                write!(f, "Callstack type mismatch, no {expected} frame to return from")
            }
            Self::CallDepthExceeded { depth } => write!(f, "Call depth {depth} exceeded"),
            Self::UnknownScenario { scenario } => write!(f, "Unknown scenario {scenario}"),
            Self::UnknownEntrypoint {
                scenario,
                entrypoint,
            } => write!(f, "Unknown entrypoint {entrypoint} in scenario {scenario}"),
            Self::InvalidPointer { scenario, index } => {
                write!(f, "Pointer {index} is outside scenario {scenario}")
            }
            Self::InOperation {
                name,
                identity,
                source,
            } => write!(f, "{name} [{identity}]: {source}"),
            Self::Handler(message) => write!(f, "{message}"),
        }
    }
}

impl Error for VmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Registration(err) => Some(err),
            Self::InOperation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for VmError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<RegistrationError> for VmError {
    fn from(err: RegistrationError) -> Self {
        Self::Registration(err)
    }
}
