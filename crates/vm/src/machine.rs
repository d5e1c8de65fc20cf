/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::error::{RegistrationError, VmError};
use crate::memory::{
    IntLocation, LOCAL_INT_SIZE, LocalMemory, Memory, STR_BANK_SIZE, STRK_PUSH_UP_SLOTS,
};
use crate::module::{Module, ModuleId};
use seq_map::SeqMap;
use std::fmt::{Display, Formatter};
use std::mem;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};
use vnscript_bytecode::prelude::{Archive, Instruction, OpcodeIdentity, Scenario, StrMemRef};

/// Target of the per dispatch trace lines.
pub const TRACE_TARGET: &str = "vnscript::trace";

pub struct MachineSetup {
    pub start_scenario: u16,
    pub start_entrypoint: i32,
    /// Emit one trace line per dispatch.
    pub trace: bool,
    /// Log and step over unregistered opcodes instead of failing.
    pub skip_unimplemented: bool,
    /// Combined depth of both call stacks.
    pub max_call_depth: usize,
}

impl Default for MachineSetup {
    fn default() -> Self {
        Self {
            start_scenario: 0,
            start_entrypoint: 0,
            trace: false,
            skip_unimplemented: false,
            max_call_depth: 256,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProgramCounter {
    pub scenario: u16,
    pub index: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Gosub,
    Farcall,
}

impl Display for FrameKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gosub => write!(f, "gosub"),
            Self::Farcall => write!(f, "farcall"),
        }
    }
}

pub struct CallFrame {
    /// The calling instruction. Returns resume here and then advance.
    pub return_to: ProgramCounter,
    pub locals: LocalMemory,
    /// Depth of the other call stack when this frame was pushed.
    pub other_stack_depth: usize,
}

/// Work that spans several ticks of the run loop, such as waiting for a
/// click or an animation. While one is on the stack it is polled instead
/// of dispatching instructions.
pub trait LongOperation {
    /// Returns `true` when done.
    ///
    /// # Errors
    /// Whatever the operation reports.
    fn tick(&mut self, machine: &mut Machine) -> Result<bool, VmError>;
}

/// A dispatched graphics command in replayable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub identity: OpcodeIdentity,
    pub parameters: Vec<Vec<u8>>,
}

pub struct Machine {
    archive: Archive,
    scenario: Rc<Scenario>,
    pc: ProgramCounter,
    line: u32,
    memory: Memory,
    store_register: i32,

    gosub_stack: Vec<CallFrame>,
    farcall_stack: Vec<CallFrame>,
    long_operations: Vec<Box<dyn LongOperation>>,

    modules: SeqMap<ModuleId, Rc<Module>>,

    undo_stack: Vec<UndoEntry>,
    replaying_graphics_stack: bool,
    parent_object: Option<i32>,

    halted: bool,
    setup: MachineSetup,
    trace_log: Vec<String>,
}

impl Machine {
    /// # Errors
    /// If the start scenario or entrypoint does not exist.
    pub fn new(archive: Archive, setup: MachineSetup) -> Result<Self, VmError> {
        let (scenario, index) =
            Self::resolve(&archive, i32::from(setup.start_scenario), setup.start_entrypoint)?;
        let pc = ProgramCounter {
            scenario: scenario.id(),
            index,
        };

        Ok(Self {
            archive,
            scenario,
            pc,
            line: 0,
            memory: Memory::new(),
            store_register: 0,
            gosub_stack: Vec::new(),
            farcall_stack: Vec::new(),
            long_operations: Vec::new(),
            modules: SeqMap::new(),
            undo_stack: Vec::new(),
            replaying_graphics_stack: false,
            parent_object: None,
            halted: false,
            setup,
            trace_log: Vec::new(),
        })
    }

    /// # Errors
    /// If a module with the same identity is already attached.
    pub fn attach_module(&mut self, module: Module) -> Result<(), RegistrationError> {
        let name = module.to_string();
        debug!(module = %name, operations = module.len(), "attaching module");
        self.modules
            .insert(module.id(), Rc::new(module))
            .map_err(|_| RegistrationError::DuplicateModule { module: name })
    }

    #[must_use]
    pub fn module(&self, module_type: u8, module: u8) -> Option<Rc<Module>> {
        self.modules.get(&ModuleId::new(module_type, module)).cloned()
    }

    #[must_use]
    pub const fn pc(&self) -> ProgramCounter {
        self.pc
    }

    #[must_use]
    pub const fn scene(&self) -> u16 {
        self.pc.scenario
    }

    /// Source line of the last dispatched instruction.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn current_scenario(&self) -> &Scenario {
        &self.scenario
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn halt(&mut self) {
        debug!(pc = ?self.pc, "halt");
        self.halted = true;
    }

    #[must_use]
    pub const fn store_register(&self) -> i32 {
        self.store_register
    }

    pub const fn set_store_register(&mut self, value: i32) {
        self.store_register = value;
    }

    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// # Errors
    /// If the location is outside its bank.
    pub fn read_int(&self, location: IntLocation) -> Result<i32, VmError> {
        match location {
            IntLocation::StoreRegister => Ok(self.store_register),
            IntLocation::Memory(reference) => self.memory.int(reference),
        }
    }

    /// # Errors
    /// If the location is outside its bank.
    pub fn write_int(&mut self, location: IntLocation, value: i32) -> Result<(), VmError> {
        match location {
            IntLocation::StoreRegister => {
                self.store_register = value;
                Ok(())
            }
            IntLocation::Memory(reference) => self.memory.set_int(reference, value),
        }
    }

    /// # Errors
    /// If the location is outside its bank.
    pub fn read_string(&self, location: StrMemRef) -> Result<String, VmError> {
        self.memory.string(location).map(str::to_string)
    }

    /// # Errors
    /// If the location is outside its bank.
    pub fn write_string(&mut self, location: StrMemRef, value: &str) -> Result<(), VmError> {
        self.memory.set_string(location, value)
    }

    /// Set while the undo stack is being replayed, so handlers can skip
    /// effects that only belong to fresh execution.
    #[must_use]
    pub const fn replaying_graphics_stack(&self) -> bool {
        self.replaying_graphics_stack
    }

    pub const fn set_replaying_graphics_stack(&mut self, replaying: bool) {
        self.replaying_graphics_stack = replaying;
    }

    #[must_use]
    pub const fn parent_object(&self) -> Option<i32> {
        self.parent_object
    }

    /// Returns the previous value.
    pub const fn set_parent_object(&mut self, parent: Option<i32>) -> Option<i32> {
        mem::replace(&mut self.parent_object, parent)
    }

    pub fn push_long_operation(&mut self, operation: Box<dyn LongOperation>) {
        self.long_operations.push(operation);
    }

    #[must_use]
    pub fn long_operation_count(&self) -> usize {
        self.long_operations.len()
    }

    #[must_use]
    pub fn undo_stack(&self) -> &[UndoEntry] {
        &self.undo_stack
    }

    pub fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
    }

    pub fn clear_undo_stack(&mut self) {
        self.undo_stack.clear();
    }

    #[must_use]
    pub const fn is_tracing(&self) -> bool {
        self.setup.trace
    }

    pub const fn set_tracing(&mut self, trace: bool) {
        self.setup.trace = trace;
    }

    pub fn take_trace_log(&mut self) -> Vec<String> {
        mem::take(&mut self.trace_log)
    }

    /// `(SEEN0001)(Line 0042): name(params)`
    pub fn trace_dispatch(&mut self, name: &str, instruction: &Instruction) {
        let line = format!(
            "(SEEN{:04})(Line {:04}): {}{}",
            self.pc.scenario,
            instruction.line(),
            name,
            instruction.parameter_debug_string()
        );
        info!(target: TRACE_TARGET, "{line}");
        self.trace_log.push(line);
    }

    #[must_use]
    pub fn gosub_depth(&self) -> usize {
        self.gosub_stack.len()
    }

    #[must_use]
    pub fn farcall_depth(&self) -> usize {
        self.farcall_stack.len()
    }

    /// Moves to the next instruction. Does nothing while replaying, as
    /// replayed instructions do not belong to the current scenario.
    pub const fn advance_instruction_pointer(&mut self) {
        if !self.replaying_graphics_stack {
            self.pc.index += 1;
        }
    }

    /// Jumps within the current scenario. `index` may be one past the end,
    /// which halts on the next step.
    ///
    /// # Errors
    /// If `index` is past the end of the scenario.
    pub fn goto(&mut self, index: usize) -> Result<(), VmError> {
        if index > self.scenario.len() {
            return Err(VmError::InvalidPointer {
                scenario: self.pc.scenario,
                index,
            });
        }
        self.pc.index = index;
        Ok(())
    }

    fn check_call_depth(&self) -> Result<(), VmError> {
        let depth = self.gosub_stack.len() + self.farcall_stack.len();
        if depth >= self.setup.max_call_depth {
            return Err(VmError::CallDepthExceeded { depth });
        }
        Ok(())
    }

    /// Calls `index` in the current scenario. The callee starts with fresh
    /// frame local memory.
    ///
    /// # Errors
    /// If the call stacks are full or `index` is outside the scenario.
    pub fn gosub(&mut self, index: usize) -> Result<(), VmError> {
        self.check_call_depth()?;
        let return_to = self.pc;
        self.goto(index)?;
        self.gosub_stack.push(CallFrame {
            return_to,
            locals: mem::take(&mut self.memory.local),
            other_stack_depth: self.farcall_stack.len(),
        });
        trace!(?return_to, index, "gosub");
        Ok(())
    }

    fn restore(&mut self, frame: CallFrame) -> Result<(), VmError> {
        if frame.return_to.scenario != self.pc.scenario {
            self.scenario = self
                .archive
                .scenario(frame.return_to.scenario)
                .ok_or(VmError::UnknownScenario {
                    scenario: i32::from(frame.return_to.scenario),
                })?;
        }
        self.memory.local = frame.locals;
        self.pc = frame.return_to;
        Ok(())
    }

    /// Returns to the calling instruction. Farcalls made since the gosub are
    /// discarded.
    ///
    /// # Errors
    /// If there is no gosub frame.
    pub fn return_from_gosub(&mut self) -> Result<(), VmError> {
        let frame = self.gosub_stack.pop().ok_or(VmError::CallstackMismatch {
            expected: FrameKind::Gosub,
        })?;
        self.farcall_stack.truncate(frame.other_stack_depth);
        trace!(return_to = ?frame.return_to, "return from gosub");
        self.restore(frame)
    }

    fn resolve(
        archive: &Archive,
        scenario: i32,
        entrypoint: i32,
    ) -> Result<(Rc<Scenario>, usize), VmError> {
        let found = u16::try_from(scenario)
            .ok()
            .and_then(|id| archive.scenario(id))
            .ok_or(VmError::UnknownScenario { scenario })?;
        let index = found
            .entrypoint(entrypoint)
            .ok_or(VmError::UnknownEntrypoint {
                scenario: found.id(),
                entrypoint,
            })?;
        Ok((found, index))
    }

    fn enter(&mut self, scenario: Rc<Scenario>, index: usize) {
        self.pc = ProgramCounter {
            scenario: scenario.id(),
            index,
        };
        self.scenario = scenario;
    }

    /// Continues at an entrypoint of another scenario without a frame.
    ///
    /// # Errors
    /// If the scenario or entrypoint does not exist.
    pub fn jump(&mut self, scenario: i32, entrypoint: i32) -> Result<(), VmError> {
        let (target, index) = Self::resolve(&self.archive, scenario, entrypoint)?;
        debug!(scenario, entrypoint, "jump");
        self.enter(target, index);
        Ok(())
    }

    /// Calls an entrypoint of another scenario.
    ///
    /// # Errors
    /// If the call stacks are full, or the scenario or entrypoint does not
    /// exist.
    pub fn farcall(&mut self, scenario: i32, entrypoint: i32) -> Result<(), VmError> {
        self.check_call_depth()?;
        let (target, index) = Self::resolve(&self.archive, scenario, entrypoint)?;
        self.farcall_stack.push(CallFrame {
            return_to: self.pc,
            locals: mem::take(&mut self.memory.local),
            other_stack_depth: self.gosub_stack.len(),
        });
        debug!(scenario, entrypoint, "farcall");
        self.enter(target, index);
        Ok(())
    }

    /// Returns to the calling instruction. Gosubs made since the farcall are
    /// discarded.
    ///
    /// # Errors
    /// If there is no farcall frame.
    pub fn return_from_farcall(&mut self) -> Result<(), VmError> {
        let frame = self.farcall_stack.pop().ok_or(VmError::CallstackMismatch {
            expected: FrameKind::Farcall,
        })?;
        self.gosub_stack.truncate(frame.other_stack_depth);
        debug!(return_to = ?frame.return_to, "return from farcall");
        self.restore(frame)
    }

    /// Writes `value` into `strK[index]` of the calling frame. Without a
    /// calling frame nothing is written.
    ///
    /// # Errors
    /// If `index` is outside the first [`STRK_PUSH_UP_SLOTS`] slots.
    pub fn push_string_value_up(&mut self, index: i32, value: &str) -> Result<(), VmError> {
        let slot = usize::try_from(index)
            .ok()
            .filter(|slot| *slot < STRK_PUSH_UP_SLOTS)
            .ok_or_else(|| VmError::InvalidMemoryAccess {
                location: format!("strK[{index}]"),
            })?;

        let gosub_is_newest = self
            .gosub_stack
            .last()
            .is_some_and(|frame| self.farcall_stack.len() <= frame.other_stack_depth);
        let frame = if gosub_is_newest {
            self.gosub_stack.last_mut()
        } else {
            self.farcall_stack.last_mut()
        };
        let Some(frame) = frame else {
            trace!(index, "no calling frame, string not pushed up");
            return Ok(());
        };

        value.clone_into(frame.locals.str_k_slot(slot));
        Ok(())
    }

    /// Fills the frame local banks with call arguments. strK grows to hold
    /// every string, integers beyond intL are dropped.
    pub fn set_call_arguments(&mut self, ints: &[i32], strings: &[String]) {
        for (slot, value) in self.memory.local.int_l.iter_mut().zip(ints) {
            *slot = *value;
        }
        for (index, value) in strings.iter().take(STR_BANK_SIZE).enumerate() {
            value.clone_into(self.memory.local.str_k_slot(index));
        }
        if ints.len() > LOCAL_INT_SIZE || strings.len() > STR_BANK_SIZE {
            warn!(
                ints = ints.len(),
                strings = strings.len(),
                "call arguments beyond the local banks were dropped"
            );
        }
    }

    /// Runs one step: polls the newest long operation if there is one,
    /// otherwise dispatches the instruction at the pointer.
    ///
    /// # Errors
    /// Whatever the long operation or the dispatched operation reports.
    pub fn execute_next_instruction(&mut self) -> Result<(), VmError> {
        if let Some(mut operation) = self.long_operations.pop() {
            let depth = self.long_operations.len();
            if operation.tick(self)? {
                trace!(depth, "long operation done");
            } else {
                self.long_operations.insert(depth, operation);
            }
            return Ok(());
        }

        if self.halted {
            return Ok(());
        }

        let scenario = Rc::clone(&self.scenario);
        let Some(instruction) = scenario.instruction(self.pc.index) else {
            debug!(pc = ?self.pc, "end of scenario");
            self.halted = true;
            return Ok(());
        };
        self.line = instruction.line();

        #[cfg(feature = "debug_vm")]
        trace!(pc = ?self.pc, identity = %instruction.identity(), "execute");

        match self.dispatch(instruction) {
            Err(err) if self.setup.skip_unimplemented && err.is_unimplemented() => {
                warn!(%err, "skipping unimplemented opcode");
                self.advance_instruction_pointer();
                Ok(())
            }
            result => result,
        }
    }

    /// Steps until halted or `max_steps` is reached. Returns the number of
    /// steps taken.
    ///
    /// # Errors
    /// The first error raised by a step.
    pub fn run(&mut self, max_steps: usize) -> Result<usize, VmError> {
        let mut steps = 0;
        while steps < max_steps && !(self.halted && self.long_operations.is_empty()) {
            self.execute_next_instruction()?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Resolves the module for `instruction` and dispatches to it.
    ///
    /// # Errors
    /// `Unimplemented` if no module or operation is registered for it,
    /// otherwise whatever the operation reports.
    pub fn dispatch(&mut self, instruction: &Instruction) -> Result<(), VmError> {
        let id = ModuleId::new(instruction.module_type(), instruction.module());
        let Some(module) = self.modules.get(&id).cloned() else {
            return Err(VmError::Unimplemented {
                identity: instruction.identity(),
                parameters: instruction.parameter_debug_string(),
            });
        };
        module.dispatch_function(self, instruction)
    }

    /// Dispatches every recorded undo entry again with the replay flag set.
    /// The stack itself is left as it was.
    ///
    /// # Errors
    /// The first error raised by a replayed operation.
    pub fn replay_undo_stack(&mut self) -> Result<(), VmError> {
        let entries = mem::take(&mut self.undo_stack);
        debug!(count = entries.len(), "replaying undo stack");

        let previous = mem::replace(&mut self.replaying_graphics_stack, true);
        let result = entries.iter().try_for_each(|entry| {
            let instruction = Instruction::new(entry.identity, entry.parameters.clone());
            self.dispatch(&instruction)
        });
        self.replaying_graphics_stack = previous;
        self.undo_stack = entries;
        result
    }
}
