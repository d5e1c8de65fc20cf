/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::error::ParseError;
use crate::instruction::Instruction;
use seq_map::SeqMap;
use std::rc::Rc;

/// One script file: a list of instructions and its entrypoint table.
#[derive(Debug)]
pub struct Scenario {
    id: u16,
    instructions: Vec<Instruction>,
    entrypoints: SeqMap<i32, usize>,
}

impl Scenario {
    #[must_use]
    pub fn new(id: u16) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            entrypoints: SeqMap::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Appends an instruction and returns its index.
    pub fn push(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// # Errors
    /// If `entrypoint` is already defined.
    pub fn add_entrypoint(&mut self, entrypoint: i32, index: usize) -> Result<(), ParseError> {
        self.entrypoints
            .insert(entrypoint, index)
            .map_err(|_| ParseError::DuplicateEntrypoint { entrypoint })
    }

    /// Entrypoint zero is the start of the scenario unless it was defined
    /// explicitly.
    #[must_use]
    pub fn entrypoint(&self, entrypoint: i32) -> Option<usize> {
        match self.entrypoints.get(&entrypoint) {
            Some(index) => Some(*index),
            None if entrypoint == 0 => Some(0),
            None => None,
        }
    }

    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// All loaded scenarios, keyed by scenario number.
#[derive(Debug, Default)]
pub struct Archive {
    scenarios: SeqMap<u16, Rc<Scenario>>,
}

impl Archive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a scenario.
    pub fn add(&mut self, scenario: Scenario) {
        let id = scenario.id();
        let scenario = Rc::new(scenario);
        if let Some(existing) = self.scenarios.get_mut(&id) {
            *existing = scenario;
        } else {
            let _ = self.scenarios.insert(id, scenario);
        }
    }

    #[must_use]
    pub fn scenario(&self, id: u16) -> Option<Rc<Scenario>> {
        self.scenarios.get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.len() == 0
    }
}
