/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub use crate::{
    jmp::{BRA_MODULE, JMP_MODULE, bra_module, evaluate_case, jmp_module},
    register_standard_modules,
};
