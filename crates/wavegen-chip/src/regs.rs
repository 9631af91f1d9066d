// SPDX-License-Identifier: AGPL-3.0-only

//! AXI-Lite register map of the waveform generator IP.
//!
//! All registers are 32-bit and word-aligned. Multi-channel registers pack
//! lane A in the low half and lane B in the high half.
//!
//! ```text
//! 0x00  MODE        [7:4]=mode B       [3:0]=mode A          shadowed
//! 0x04  RUN         [1]=enable B       [0]=enable A          immediate
//! 0x08  FREQ_A      [31:0] 100 µHz units                     shadowed
//! 0x0C  FREQ_B      [31:0] 100 µHz units                     shadowed
//! 0x10  OFFSET      [31:16]=B  [15:0]=A  (signed)            shadowed
//! 0x14  AMPLITUDE   [31:16]=B  [15:0]=A                      shadowed
//! 0x18  DUTY_CYCLE  [31:16]=B  [15:0]=A                      shadowed
//! 0x1C  CYCLES      [31:16]=B  [15:0]=A  (0 = continuous)    shadowed
//! 0x20  PHASE       [31:16]=B  [15:0]=A  (signed, 0.01°)     shadowed
//! 0x24  ARB_DEPTH   [31:0] sample count                      immediate
//! 0x28  ARB_DATA    [15:0] sample, word i at +4·i            immediate
//! 0x2C  RECONFIG    write-any: shadow → active, both lanes   strobe
//! 0x30  STATUS      RO, see [`status`]
//! 0x34  TRIGGER     [1]=B [0]=A                              strobe
//! 0x38  SOFT_RST    [1]=B [0]=A                              strobe
//! ```

use crate::field::PackedField;
use crate::lane::Lane;

// ── Address window ───────────────────────────────────────────────────────────

/// Default physical base address (Zynq GP0 AXI slave).
pub const BASE_ADDR: u64 = 0x43C0_0000;

/// Size of the IP's address window in bytes.
pub const ADDR_RANGE: usize = 0x1_0000;

// ── Register offsets ─────────────────────────────────────────────────────────

/// Waveform mode, 4 bits per lane.
pub const MODE: usize = 0x00;
/// Output enable, one bit per lane.
pub const RUN: usize = 0x04;
/// Lane A frequency, full word.
pub const FREQ_A: usize = 0x08;
/// Lane B frequency, full word.
pub const FREQ_B: usize = 0x0C;
/// DC offset, signed half-word per lane.
pub const OFFSET: usize = 0x10;
/// Amplitude, half-word per lane.
pub const AMPLITUDE: usize = 0x14;
/// Duty cycle, half-word per lane.
pub const DUTY_CYCLE: usize = 0x18;
/// Burst cycle count, half-word per lane.
pub const CYCLES: usize = 0x1C;
/// Phase offset, signed half-word per lane.
pub const PHASE: usize = 0x20;
/// Arbitrary-waveform depth (active sample count).
pub const ARB_DEPTH: usize = 0x24;
/// Arbitrary-waveform sample port; sample `i` at `ARB_DATA + 4·i`.
pub const ARB_DATA: usize = 0x28;
/// Reconfigure strobe.
pub const RECONFIG: usize = 0x2C;
/// Read-only status.
pub const STATUS: usize = 0x30;
/// Trigger strobe.
pub const TRIGGER: usize = 0x34;
/// Soft-reset strobe.
pub const SOFT_RST: usize = 0x38;

/// Value written to [`RECONFIG`] to commit the shadow bank.
pub const RECONFIG_COMMIT: u32 = 1;

/// Byte offset of arbitrary sample `index`.
#[must_use]
pub const fn arb_sample_offset(index: u32) -> usize {
    ARB_DATA + (index as usize) * 4
}

// ── Status register bit definitions ──────────────────────────────────────────

/// [`STATUS`] bits.
pub mod status {
    use crate::lane::Lane;

    /// Core out of reset and clocked.
    pub const READY: u32 = 1 << 0;
    /// Shadow → active copy in progress.
    pub const RECONFIG_BUSY: u32 = 1 << 1;
    /// Lane A producing output.
    pub const CHA_RUNNING: u32 = 1 << 2;
    /// Lane B producing output.
    pub const CHB_RUNNING: u32 = 1 << 3;

    /// Running bit for `lane`.
    #[must_use]
    pub const fn running(lane: Lane) -> u32 {
        match lane {
            Lane::A => CHA_RUNNING,
            Lane::B => CHB_RUNNING,
        }
    }
}

// ── Structured description ───────────────────────────────────────────────────

/// How a register's 32 bits are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One value over the full word.
    Whole,
    /// One sub-field per lane.
    Packed(PackedField),
    /// Bit 0 = lane A, bit 1 = lane B.
    LaneFlags,
    /// Value ignored; the write itself is the event.
    Strobe,
    /// Indexed sample window.
    Window,
    /// Hardware-owned bits.
    ReadOnly,
}

/// One of the 15 register slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// See [`MODE`].
    Mode,
    /// See [`RUN`].
    Run,
    /// See [`FREQ_A`].
    FrequencyA,
    /// See [`FREQ_B`].
    FrequencyB,
    /// See [`OFFSET`].
    Offset,
    /// See [`AMPLITUDE`].
    Amplitude,
    /// See [`DUTY_CYCLE`].
    DutyCycle,
    /// See [`CYCLES`].
    Cycles,
    /// See [`PHASE`].
    Phase,
    /// See [`ARB_DEPTH`].
    ArbDepth,
    /// See [`ARB_DATA`].
    ArbData,
    /// See [`RECONFIG`].
    Reconfig,
    /// See [`STATUS`].
    Status,
    /// See [`TRIGGER`].
    Trigger,
    /// See [`SOFT_RST`].
    SoftReset,
}

impl Register {
    /// All registers in offset order.
    pub const ALL: [Self; 15] = [
        Self::Mode,
        Self::Run,
        Self::FrequencyA,
        Self::FrequencyB,
        Self::Offset,
        Self::Amplitude,
        Self::DutyCycle,
        Self::Cycles,
        Self::Phase,
        Self::ArbDepth,
        Self::ArbData,
        Self::Reconfig,
        Self::Status,
        Self::Trigger,
        Self::SoftReset,
    ];

    /// Byte offset from the IP base.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Mode => MODE,
            Self::Run => RUN,
            Self::FrequencyA => FREQ_A,
            Self::FrequencyB => FREQ_B,
            Self::Offset => OFFSET,
            Self::Amplitude => AMPLITUDE,
            Self::DutyCycle => DUTY_CYCLE,
            Self::Cycles => CYCLES,
            Self::Phase => PHASE,
            Self::ArbDepth => ARB_DEPTH,
            Self::ArbData => ARB_DATA,
            Self::Reconfig => RECONFIG,
            Self::Status => STATUS,
            Self::Trigger => TRIGGER,
            Self::SoftReset => SOFT_RST,
        }
    }

    /// Bit layout.
    #[must_use]
    pub const fn layout(self) -> Layout {
        match self {
            Self::Mode => Layout::Packed(PackedField::MODE),
            Self::Offset | Self::Amplitude | Self::DutyCycle | Self::Cycles | Self::Phase => {
                Layout::Packed(PackedField::HALF_WORD)
            }
            Self::FrequencyA | Self::FrequencyB | Self::ArbDepth => Layout::Whole,
            Self::Run | Self::Trigger | Self::SoftReset => Layout::LaneFlags,
            Self::Reconfig => Layout::Strobe,
            Self::ArbData => Layout::Window,
            Self::Status => Layout::ReadOnly,
        }
    }

    /// Whether software writes land in the shadow bank and only take effect
    /// after a [`RECONFIG`] commit.
    #[must_use]
    pub const fn is_shadowed(self) -> bool {
        matches!(
            self,
            Self::Mode
                | Self::FrequencyA
                | Self::FrequencyB
                | Self::Offset
                | Self::Amplitude
                | Self::DutyCycle
                | Self::Cycles
                | Self::Phase
        )
    }

    /// Register at exactly `offset`, if any.
    ///
    /// Offsets past [`ARB_DATA`] resolve to the control register at that
    /// address, not to a sample slot.
    #[must_use]
    pub fn at(offset: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.offset() == offset)
    }

    /// Frequency register for `lane`.
    #[must_use]
    pub const fn frequency(lane: Lane) -> Self {
        match lane {
            Lane::A => Self::FrequencyA,
            Lane::B => Self::FrequencyB,
        }
    }

    /// Short upper-case name as used in the IP documentation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mode => "MODE",
            Self::Run => "RUN",
            Self::FrequencyA => "FREQ_A",
            Self::FrequencyB => "FREQ_B",
            Self::Offset => "OFFSET",
            Self::Amplitude => "AMPLTD",
            Self::DutyCycle => "DTCYC",
            Self::Cycles => "CYCLES",
            Self::Phase => "PHASE",
            Self::ArbDepth => "ARB_DEPTH",
            Self::ArbData => "ARB_DATA",
            Self::Reconfig => "RECONFIG",
            Self::Status => "STATUS",
            Self::Trigger => "TRIGGER",
            Self::SoftReset => "SOFT_RST",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_word_aligned_slots() {
        assert_eq!(Register::ALL.len(), 15);
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.offset(), i * 4, "{} misplaced", reg.name());
        }
        assert!(SOFT_RST + 4 <= ADDR_RANGE);
    }

    #[test]
    fn lookup_by_offset() {
        assert_eq!(Register::at(0x2C), Some(Register::Reconfig));
        assert_eq!(Register::at(0x30), Some(Register::Status));
        assert_eq!(Register::at(0x3C), None);
        assert_eq!(Register::at(0x29), None);
    }

    #[test]
    fn sample_offsets_are_word_strided() {
        assert_eq!(arb_sample_offset(0), 0x28);
        assert_eq!(arb_sample_offset(1), 0x2C);
        assert_eq!(arb_sample_offset(4095), 0x28 + 4095 * 4);
    }

    #[test]
    fn only_configuration_is_shadowed() {
        let shadowed: Vec<_> = Register::ALL.into_iter().filter(|r| r.is_shadowed()).collect();
        assert_eq!(shadowed.len(), 8);
        assert!(!Register::Run.is_shadowed());
        assert!(!Register::ArbDepth.is_shadowed());
    }

    #[test]
    fn packed_registers_use_expected_widths() {
        assert_eq!(Register::Mode.layout(), Layout::Packed(PackedField::MODE));
        assert_eq!(Register::Phase.layout(), Layout::Packed(PackedField::HALF_WORD));
        assert_eq!(Register::FrequencyB.layout(), Layout::Whole);
        assert_eq!(Register::frequency(Lane::B).offset(), FREQ_B);
    }

    #[test]
    fn status_bits_distinct() {
        let bits = [
            status::READY,
            status::RECONFIG_BUSY,
            status::CHA_RUNNING,
            status::CHB_RUNNING,
        ];
        assert_eq!(bits.iter().fold(0, |acc, b| acc | b), 0b1111);
        assert_eq!(status::running(Lane::B), status::CHB_RUNNING);
    }
}
