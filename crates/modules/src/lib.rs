/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
pub mod jmp;
pub mod prelude;

use vnscript_vm::Machine;
use vnscript_vm::error::RegistrationError;

/// Attaches the control flow modules.
///
/// # Errors
/// If one of them is already attached.
pub fn register_standard_modules(machine: &mut Machine) -> Result<(), RegistrationError> {
    machine.attach_module(jmp::jmp_module()?)?;
    machine.attach_module(jmp::bra_module()?)
}
