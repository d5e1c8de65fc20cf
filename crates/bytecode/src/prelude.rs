/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub use crate::{
    bank::{AccessWidth, IntBank, IntMemRef, StrBank, StrMemRef},
    error::ParseError,
    expression::{ExpressionPiece, ValueType},
    instruction::{Instruction, OpcodeIdentity},
    parse::{get_complex_param, get_data, get_expression},
    printable::{parsable_to_printable, printable_to_parsable},
    scenario::{Archive, Scenario},
};
