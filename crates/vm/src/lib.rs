/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub mod adapter;
pub mod error;
mod eval;
pub mod machine;
pub mod memory;
pub mod module;
pub mod operation;
pub mod param;
pub mod prelude;

pub use machine::{
    CallFrame, FrameKind, LongOperation, Machine, MachineSetup, ProgramCounter, TRACE_TARGET,
    UndoEntry,
};
