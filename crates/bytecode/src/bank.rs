/*
 * Copyright (c) Peter Bjorklund. All rights reserved. https://github.com/swamp/swamp
 * Licensed under the MIT License. See LICENSE in the project root for license information.
 */
use std::fmt::{Display, Formatter};

/// Bank id that marks the machine store register.
pub const STORE_REGISTER_LOCATION: u8 = 0xC8;

/// Bank id that prefixes a four byte little-endian integer constant.
pub const INT_CONSTANT_LOCATION: u8 = 0xFF;

pub const STRK_LOCATION: u8 = 0x0A;
pub const STRM_LOCATION: u8 = 0x0C;
pub const STRS_LOCATION: u8 = 0x12;

pub const INTL_LOCATION: u8 = 11;
pub const INTZ_LOCATION: u8 = 25;

/// Number of bank ids sharing one access width.
const BANKS_PER_WIDTH: u8 = 26;

#[must_use]
pub const fn is_string_location(bank_id: u8) -> bool {
    matches!(bank_id, STRK_LOCATION | STRM_LOCATION | STRS_LOCATION)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IntBank {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    Z,
    /// Frame local.
    L,
}

impl IntBank {
    /// Index into the global integer banks, `None` for the frame local bank.
    #[must_use]
    pub const fn global_index(self) -> Option<usize> {
        match self {
            Self::A => Some(0),
            Self::B => Some(1),
            Self::C => Some(2),
            Self::D => Some(3),
            Self::E => Some(4),
            Self::F => Some(5),
            Self::G => Some(6),
            Self::Z => Some(7),
            Self::L => None,
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::Z => 'Z',
            Self::L => 'L',
        }
    }

    #[must_use]
    pub const fn bytecode_id(self) -> u8 {
        match self {
            Self::Z => INTZ_LOCATION,
            Self::L => INTL_LOCATION,
            other => match other.global_index() {
                Some(index) => index as u8,
                None => INTL_LOCATION,
            },
        }
    }
}

/// How many bits of a 32-bit cell one element occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessWidth {
    Full,
    Bit1,
    Bit2,
    Bit4,
    Bit8,
}

impl AccessWidth {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Full => 32,
            Self::Bit1 => 1,
            Self::Bit2 => 2,
            Self::Bit4 => 4,
            Self::Bit8 => 8,
        }
    }

    const fn from_bytecode(width: u8) -> Option<Self> {
        Some(match width {
            0 => Self::Full,
            1 => Self::Bit1,
            2 => Self::Bit2,
            3 => Self::Bit4,
            4 => Self::Bit8,
            _ => return None,
        })
    }

    const fn bytecode(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::Bit1 => 1,
            Self::Bit2 => 2,
            Self::Bit4 => 3,
            Self::Bit8 => 4,
        }
    }

    /// Suffix used in debug output, e.g. `intA2b`.
    const fn suffix(self) -> &'static str {
        match self {
            Self::Full => "",
            Self::Bit1 => "b",
            Self::Bit2 => "2b",
            Self::Bit4 => "4b",
            Self::Bit8 => "8b",
        }
    }
}

/// An integer memory location. The index is already evaluated, so the
/// reference stays valid no matter what happens to the memory behind it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IntMemRef {
    pub bank: IntBank,
    pub width: AccessWidth,
    pub index: i32,
}

impl IntMemRef {
    #[must_use]
    pub const fn new(bank: IntBank, index: i32) -> Self {
        Self {
            bank,
            width: AccessWidth::Full,
            index,
        }
    }

    #[must_use]
    pub const fn with_width(bank: IntBank, width: AccessWidth, index: i32) -> Self {
        Self { bank, width, index }
    }

    /// Decodes a bytecode bank id: `id % 26` selects the bank and
    /// `id / 26` the access width.
    #[must_use]
    pub const fn from_bytecode(bank_id: u8, index: i32) -> Option<Self> {
        let Some(width) = AccessWidth::from_bytecode(bank_id / BANKS_PER_WIDTH) else {
            return None;
        };
        let bank = match bank_id % BANKS_PER_WIDTH {
            0 => IntBank::A,
            1 => IntBank::B,
            2 => IntBank::C,
            3 => IntBank::D,
            4 => IntBank::E,
            5 => IntBank::F,
            6 => IntBank::G,
            INTZ_LOCATION => IntBank::Z,
            INTL_LOCATION => IntBank::L,
            _ => return None,
        };

        Some(Self { bank, width, index })
    }

    #[must_use]
    pub const fn bytecode_id(&self) -> u8 {
        self.width.bytecode() * BANKS_PER_WIDTH + self.bank.bytecode_id()
    }
}

impl Display for IntMemRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "int{}{}[{}]",
            self.bank.letter(),
            self.width.suffix(),
            self.index
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StrBank {
    /// Frame local.
    K,
    M,
    S,
}

impl StrBank {
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::K => 'K',
            Self::M => 'M',
            Self::S => 'S',
        }
    }

    #[must_use]
    pub const fn bytecode_id(self) -> u8 {
        match self {
            Self::K => STRK_LOCATION,
            Self::M => STRM_LOCATION,
            Self::S => STRS_LOCATION,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StrMemRef {
    pub bank: StrBank,
    pub index: i32,
}

impl StrMemRef {
    #[must_use]
    pub const fn new(bank: StrBank, index: i32) -> Self {
        Self { bank, index }
    }

    #[must_use]
    pub const fn from_bytecode(bank_id: u8, index: i32) -> Option<Self> {
        let bank = match bank_id {
            STRK_LOCATION => StrBank::K,
            STRM_LOCATION => StrBank::M,
            STRS_LOCATION => StrBank::S,
            _ => return None,
        };
        Some(Self { bank, index })
    }
}

impl Display for StrMemRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "str{}[{}]", self.bank.letter(), self.index)
    }
}

/// Debug name of a bank id, used when the index is not yet evaluated.
#[must_use]
pub fn bank_debug_name(bank_id: u8) -> String {
    match bank_id {
        STRK_LOCATION => "strK".to_string(),
        STRM_LOCATION => "strM".to_string(),
        STRS_LOCATION => "strS".to_string(),
        _ => match IntMemRef::from_bytecode(bank_id, 0) {
            Some(reference) => format!("int{}{}", reference.bank.letter(), reference.width.suffix()),
            None => format!("bank{bank_id:02X}"),
        },
    }
}
