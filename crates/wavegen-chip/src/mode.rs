// SPDX-License-Identifier: AGPL-3.0-only

//! Waveform mode codes.
//!
//! Each lane has a 4-bit mode field in the mode register. Only codes 0–5
//! are defined; the generator's behaviour for 6–15 is undocumented.

/// Built-in waveform shapes, plus arbitrary (sample-memory) playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum WaveformMode {
    /// Constant level (offset only).
    #[default]
    Dc = 0,
    /// Sine from the internal LUT.
    Sine = 1,
    /// Rising ramp.
    Sawtooth = 2,
    /// Symmetric ramp.
    Triangle = 3,
    /// Square with programmable duty cycle.
    Square = 4,
    /// Playback of the arbitrary sample memory.
    Arbitrary = 5,
}

/// Raw mode code outside 0–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMode(pub u32);

impl std::fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mode {} out of range (max {})",
            self.0,
            WaveformMode::MAX_RAW
        )
    }
}

impl std::error::Error for InvalidMode {}

impl WaveformMode {
    /// Highest defined raw code.
    pub const MAX_RAW: u32 = Self::Arbitrary as u32;

    /// Every defined mode, in code order.
    pub const ALL: [Self; 6] = [
        Self::Dc,
        Self::Sine,
        Self::Sawtooth,
        Self::Triangle,
        Self::Square,
        Self::Arbitrary,
    ];

    /// Raw register code.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Lower-case name, as accepted by [`str::parse`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dc => "dc",
            Self::Sine => "sine",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Arbitrary => "arbitrary",
        }
    }
}

impl TryFrom<u32> for WaveformMode {
    type Error = InvalidMode;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Dc),
            1 => Ok(Self::Sine),
            2 => Ok(Self::Sawtooth),
            3 => Ok(Self::Triangle),
            4 => Ok(Self::Square),
            5 => Ok(Self::Arbitrary),
            other => Err(InvalidMode(other)),
        }
    }
}

impl std::str::FromStr for WaveformMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dc" => Ok(Self::Dc),
            "sine" | "sin" => Ok(Self::Sine),
            "sawtooth" | "saw" => Ok(Self::Sawtooth),
            "triangle" | "tri" => Ok(Self::Triangle),
            "square" | "sq" => Ok(Self::Square),
            "arbitrary" | "arb" => Ok(Self::Arbitrary),
            other => Err(format!("unknown waveform mode '{other}'")),
        }
    }
}

impl std::fmt::Display for WaveformMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
