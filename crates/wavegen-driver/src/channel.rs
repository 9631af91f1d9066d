// SPDX-License-Identifier: AGPL-3.0-only

//! Channel selection and fan-out
//!
//! Callers address `A`, `B` or `Both`; registers only know lanes. `Both`
//! never reaches storage: it is expanded here into either two ordered
//! per-lane operations (packed and per-lane registers) or one combined
//! two-bit value (enable, trigger, reset). Both lanes always receive the
//! same value; divergent values take two calls.

use wavegen_chip::Lane;

use crate::error::{Result, WavegenError};

/// Logical channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Channel A only
    A,
    /// Channel B only
    B,
    /// A then B, same value
    Both,
}

impl Channel {
    /// Lanes addressed, in write order (A before B)
    #[must_use]
    pub const fn lanes(self) -> &'static [Lane] {
        match self {
            Self::A => &[Lane::A],
            Self::B => &[Lane::B],
            Self::Both => &Lane::ALL,
        }
    }

    /// Combined flag bits for enable/trigger/reset registers
    #[must_use]
    pub const fn flag_bits(self) -> u32 {
        match self {
            Self::A => 0b01,
            Self::B => 0b10,
            Self::Both => 0b11,
        }
    }

    /// Whether `lane` is addressed
    #[must_use]
    pub const fn includes(self, lane: Lane) -> bool {
        self.flag_bits() & lane.flag_bit() != 0
    }
}

impl From<Lane> for Channel {
    fn from(lane: Lane) -> Self {
        match lane {
            Lane::A => Self::A,
            Lane::B => Self::B,
        }
    }
}

impl TryFrom<u32> for Channel {
    type Error = WavegenError;

    /// Boundary encoding: 0 = A, 1 = B, 2 = Both
    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::A),
            1 => Ok(Self::B),
            2 => Ok(Self::Both),
            other => Err(WavegenError::invalid_parameter(format!(
                "channel {other} not recognized (expected 0=A, 1=B, 2=Both)"
            ))),
        }
    }
}

impl From<Channel> for u32 {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::A => 0,
            Channel::B => 1,
            Channel::Both => 2,
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = WavegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "0" => Ok(Self::A),
            "b" | "1" => Ok(Self::B),
            "both" | "ab" | "2" => Ok(Self::Both),
            other => Err(WavegenError::invalid_parameter(format!(
                "channel '{other}' not recognized (expected a, b or both)"
            ))),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::Both => write!(f, "A+B"),
        }
    }
}

/// Expand `channel` into ordered `(lane, value)` pairs
pub fn resolve<T: Copy>(channel: Channel, value: T) -> impl Iterator<Item = (Lane, T)> {
    channel.lanes().iter().map(move |&lane| (lane, value))
}
