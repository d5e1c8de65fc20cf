/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use crate::error::VmError;
use vnscript_bytecode::prelude::{AccessWidth, IntBank, IntMemRef, StrBank, StrMemRef};

pub const INT_BANK_SIZE: usize = 2000;
pub const LOCAL_INT_SIZE: usize = 40;
pub const STR_BANK_SIZE: usize = 2000;
/// strK slots a callee can write into its caller's frame.
pub const STRK_PUSH_UP_SLOTS: usize = 3;

const GLOBAL_INT_BANK_COUNT: usize = 8;

/// Memory owned by the current call frame. strK grows on write, up to
/// [`STR_BANK_SIZE`] slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMemory {
    pub int_l: [i32; LOCAL_INT_SIZE],
    pub str_k: Vec<String>,
}

impl Default for LocalMemory {
    fn default() -> Self {
        Self {
            int_l: [0; LOCAL_INT_SIZE],
            str_k: Vec::new(),
        }
    }
}

impl LocalMemory {
    /// Grows strK so `index` is a valid slot.
    pub fn str_k_slot(&mut self, index: usize) -> &mut String {
        if index >= self.str_k.len() {
            self.str_k.resize(index + 1, String::new());
        }
        &mut self.str_k[index]
    }
}

/// Script memory banks. Frame local banks live in [`LocalMemory`] and are
/// swapped in and out by the call stacks.
#[derive(Debug)]
pub struct Memory {
    int_banks: Vec<Vec<i32>>,
    str_m: Vec<String>,
    str_s: Vec<String>,
    pub local: LocalMemory,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(location: impl ToString) -> VmError {
    VmError::InvalidMemoryAccess {
        location: location.to_string(),
    }
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            int_banks: vec![vec![0; INT_BANK_SIZE]; GLOBAL_INT_BANK_COUNT],
            str_m: vec![String::new(); STR_BANK_SIZE],
            str_s: vec![String::new(); STR_BANK_SIZE],
            local: LocalMemory::default(),
        }
    }

    fn int_cells(&self, bank: IntBank) -> &[i32] {
        match bank.global_index() {
            Some(index) => &self.int_banks[index],
            None => &self.local.int_l,
        }
    }

    fn int_cells_mut(&mut self, bank: IntBank) -> &mut [i32] {
        match bank.global_index() {
            Some(index) => &mut self.int_banks[index],
            None => &mut self.local.int_l,
        }
    }

    /// Cell index, bit shift and mask for a (possibly packed) reference.
    fn locate(cell_count: usize, reference: IntMemRef) -> Result<(usize, u32, u32), VmError> {
        let index = usize::try_from(reference.index).map_err(|_| invalid(reference))?;

        if reference.width == AccessWidth::Full {
            if index >= cell_count {
                return Err(invalid(reference));
            }
            return Ok((index, 0, u32::MAX));
        }

        let bits = reference.width.bits();
        let per_cell = (32 / bits) as usize;
        if index >= cell_count * per_cell {
            return Err(invalid(reference));
        }
        let shift = (index % per_cell) as u32 * bits;
        let mask = (1u32 << bits) - 1;
        Ok((index / per_cell, shift, mask))
    }

    /// # Errors
    /// If the index is outside the bank.
    pub fn int(&self, reference: IntMemRef) -> Result<i32, VmError> {
        let cells = self.int_cells(reference.bank);
        let (cell, shift, mask) = Self::locate(cells.len(), reference)?;
        if mask == u32::MAX {
            return Ok(cells[cell]);
        }
        Ok(((cells[cell] as u32 >> shift) & mask) as i32)
    }

    /// Packed writes keep only the low bits of `value`.
    ///
    /// # Errors
    /// If the index is outside the bank.
    pub fn set_int(&mut self, reference: IntMemRef, value: i32) -> Result<(), VmError> {
        let cells = self.int_cells_mut(reference.bank);
        let (cell, shift, mask) = Self::locate(cells.len(), reference)?;
        if mask == u32::MAX {
            cells[cell] = value;
            return Ok(());
        }
        let existing = cells[cell] as u32 & !(mask << shift);
        cells[cell] = (existing | ((value as u32 & mask) << shift)) as i32;
        Ok(())
    }

    fn str_index(reference: StrMemRef) -> Result<usize, VmError> {
        usize::try_from(reference.index)
            .ok()
            .filter(|index| *index < STR_BANK_SIZE)
            .ok_or_else(|| invalid(reference))
    }

    fn str_cells(&self, bank: StrBank) -> &[String] {
        match bank {
            StrBank::K => &self.local.str_k,
            StrBank::M => &self.str_m,
            StrBank::S => &self.str_s,
        }
    }

    /// strK slots that were never written read as an empty string.
    ///
    /// # Errors
    /// If the index is outside the bank.
    pub fn string(&self, reference: StrMemRef) -> Result<&str, VmError> {
        let index = Self::str_index(reference)?;
        Ok(self
            .str_cells(reference.bank)
            .get(index)
            .map_or("", String::as_str))
    }

    /// # Errors
    /// If the index is outside the bank.
    pub fn set_string(&mut self, reference: StrMemRef, value: &str) -> Result<(), VmError> {
        let index = Self::str_index(reference)?;
        let slot = match reference.bank {
            StrBank::K => self.local.str_k_slot(index),
            StrBank::M => &mut self.str_m[index],
            StrBank::S => &mut self.str_s[index],
        };
        value.clone_into(slot);
        Ok(())
    }
}

/// A writable integer location: the store register or a memory cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntLocation {
    StoreRegister,
    Memory(IntMemRef),
}

impl std::fmt::Display for IntLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreRegister => write!(f, "<store>"),
            Self::Memory(reference) => write!(f, "{reference}"),
        }
    }
}
