// SPDX-License-Identifier: AGPL-3.0-only

//! Hardware lanes.
//!
//! The IP has exactly two output channels. Every multi-channel register
//! stores lane A in its low half (or bit 0) and lane B in its high half
//! (or bit 1).

/// One physical output channel of the IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    /// Channel A: low half, flag bit 0.
    A = 0,
    /// Channel B: high half, flag bit 1.
    B = 1,
}

impl Lane {
    /// Both lanes, in write order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// Zero-based lane index (A = 0, B = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The lane's bit in a two-bit flag register (enable, trigger, reset).
    #[must_use]
    pub const fn flag_bit(self) -> u32 {
        1 << (self as u32)
    }

    /// The other lane.
    #[must_use]
    pub const fn sibling(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}
