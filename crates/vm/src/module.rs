/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::Machine;
use crate::error::{RegistrationError, VmError};
use crate::operation::{Operation, OwningModule, Properties, UndefinedFunction};
use seq_map::SeqMap;
use std::fmt::{Display, Formatter};
use tracing::debug;
use vnscript_bytecode::prelude::{Instruction, OpcodeIdentity};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub module_type: u8,
    pub module: u8,
}

impl ModuleId {
    #[must_use]
    pub const fn new(module_type: u8, module: u8) -> Self {
        Self {
            module_type,
            module,
        }
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module_type, self.module)
    }
}

/// `(opcode << 8) | overload`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey(pub u32);

impl OperationKey {
    #[must_use]
    pub const fn new(opcode: u16, overload: u8) -> Self {
        Self(((opcode as u32) << 8) | overload as u32)
    }

    #[must_use]
    pub const fn opcode(self) -> u16 {
        (self.0 >> 8) as u16
    }

    #[must_use]
    pub const fn overload(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

/// Applied to every operation as it is registered.
pub type OperationMapper = fn(Box<dyn Operation>) -> Box<dyn Operation>;

/// A named group of operations sharing one `(module type, module number)`.
pub struct Module {
    id: ModuleId,
    name: String,
    operations: SeqMap<OperationKey, Box<dyn Operation>>,
    properties: Properties,
    mapper: Option<OperationMapper>,
}

impl Module {
    #[must_use]
    pub fn new(module_type: u8, module: u8, name: &str) -> Self {
        Self {
            id: ModuleId::new(module_type, module),
            name: name.to_string(),
            operations: SeqMap::new(),
            properties: Properties::new(),
            mapper: None,
        }
    }

    /// A module that wraps every added operation with `mapper`, see
    /// [`crate::adapter`].
    #[must_use]
    pub fn mapped(module_type: u8, module: u8, name: &str, mapper: OperationMapper) -> Self {
        Self {
            mapper: Some(mapper),
            ..Self::new(module_type, module, name)
        }
    }

    #[must_use]
    pub const fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn owning(&self) -> OwningModule {
        OwningModule {
            id: self.id,
            name: self.name.clone(),
            defaults: self.properties.clone(),
        }
    }

    /// # Errors
    /// If `(opcode, overload)` is already registered.
    pub fn add_opcode(
        &mut self,
        opcode: u16,
        overload: u8,
        name: &str,
        mut operation: Box<dyn Operation>,
    ) -> Result<(), RegistrationError> {
        let key = OperationKey::new(opcode, overload);
        if self.operations.contains_key(&key) {
            return Err(RegistrationError::DuplicateOpcode {
                module: self.to_string(),
                opcode,
                overload,
            });
        }

        operation.set_name(name);
        operation.attach(self.owning());
        let operation = match self.mapper {
            Some(mapper) => mapper(operation),
            None => operation,
        };

        self.operations
            .insert(key, operation)
            .map_err(|_| RegistrationError::DuplicateOpcode {
                module: self.to_string(),
                opcode,
                overload,
            })
    }

    /// Registers a placeholder that reports the opcode as known but
    /// unsupported.
    ///
    /// # Errors
    /// If `(opcode, overload)` is already registered.
    pub fn add_unsupported_opcode(
        &mut self,
        opcode: u16,
        overload: u8,
        name: &str,
    ) -> Result<(), RegistrationError> {
        let identity =
            OpcodeIdentity::new(self.id.module_type, self.id.module, opcode, overload);
        self.add_opcode(
            opcode,
            overload,
            name,
            Box::new(UndefinedFunction::new(identity)),
        )
    }

    /// Sets a module default, visible to every operation without its own
    /// value for `key`.
    pub fn set_property(&mut self, key: i32, value: i32) {
        self.properties.set(key, value);
        let owning = self.owning();
        let keys: Vec<OperationKey> = self.operations.keys().copied().collect();
        for key in keys {
            if let Some(operation) = self.operations.get_mut(&key) {
                operation.attach(owning.clone());
            }
        }
    }

    #[must_use]
    pub fn property(&self, key: i32) -> Option<i32> {
        self.properties.get(key)
    }

    #[must_use]
    pub fn operation(&self, key: OperationKey) -> Option<&dyn Operation> {
        self.operations.get(&key).map(Box::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.len() == 0
    }

    /// Resolves and runs the operation for `instruction`.
    ///
    /// # Errors
    /// `Unimplemented` for an unregistered key, otherwise the operation's
    /// error annotated with its name and identity.
    pub fn dispatch_function(
        &self,
        machine: &mut Machine,
        instruction: &Instruction,
    ) -> Result<(), VmError> {
        let identity = instruction.identity();
        let key = OperationKey::new(identity.opcode, identity.overload);
        let Some(operation) = self.operations.get(&key) else {
            return Err(VmError::Unimplemented {
                identity,
                parameters: instruction.parameter_debug_string(),
            });
        };

        if machine.is_tracing() {
            machine.trace_dispatch(operation.name(), instruction);
        }

        operation
            .dispatch_function(machine, instruction)
            .map_err(|err| {
                debug!(%identity, name = operation.name(), %err, "operation failed");
                err.in_operation(operation.name(), identity)
            })
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mod<{},{}:{}>",
            self.name, self.id.module_type, self.id.module
        )
    }
}
