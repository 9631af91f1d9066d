// SPDX-License-Identifier: AGPL-3.0-only

//! Software (model) backend
//!
//! Implements `RegisterBackend` against an in-memory model of the waveform
//! generator IP. The model keeps the two register banks the hardware has:
//!
//! ```text
//! software write ──► shadow bank ──(RECONFIG strobe)──► active bank ──► DDS
//!                         ▲
//! software read  ─────────┘   (AXI readback returns the shadow copy)
//! ```
//!
//! Run/enable, arbitrary depth and sample memory are immediate; trigger and
//! soft reset are strobes that act on the running state. Every write is kept
//! in an ordered log so tests can assert on issue order.
//!
//! Not modelled: waveform synthesis itself, burst cycle counting.

use std::cell::Cell;

use wavegen_chip::regs::{self, Register};
use wavegen_chip::Lane;

use crate::backend::{BackendType, RegisterBackend};
use crate::config::DriverConfig;
use crate::error::{Result, WavegenError};

/// Sample words of modelled arbitrary-waveform memory.
pub const DEFAULT_ARB_CAPACITY: usize = 16_384;

const SLOTS: usize = Register::ALL.len();

/// In-memory model of the waveform generator IP.
#[derive(Debug)]
pub struct SoftwareBackend {
    shadow: [u32; SLOTS],
    active: [u32; SLOTS],
    run: u32,
    running: u32,
    arb_depth: u32,
    samples: Vec<u16>,

    ready: bool,
    /// Status reads that still report `reconfig_busy` after a commit
    busy_remaining: Cell<u32>,
    reconfig_latency: u32,
    reconfig_count: u32,

    write_log: Vec<(usize, u32)>,
    /// Writes left before an injected failure (`None` = never fail)
    fault_after: Option<usize>,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    /// Fresh model in its power-on state: all registers zero, core ready.
    pub fn new() -> Self {
        Self::with_arb_capacity(DEFAULT_ARB_CAPACITY)
    }

    /// Model with `capacity` words of arbitrary sample memory.
    pub fn with_arb_capacity(capacity: usize) -> Self {
        Self {
            shadow: [0; SLOTS],
            active: [0; SLOTS],
            run: 0,
            running: 0,
            arb_depth: 0,
            samples: vec![0; capacity],
            ready: true,
            busy_remaining: Cell::new(0),
            reconfig_latency: 0,
            reconfig_count: 0,
            write_log: Vec::new(),
            fault_after: None,
        }
    }

    /// Report `reconfig_busy` for the next `polls` status reads after each commit.
    pub fn with_reconfig_latency(mut self, polls: u32) -> Self {
        self.reconfig_latency = polls;
        self
    }

    /// Fail the write issued after `writes` more successful ones.
    pub fn fail_after_writes(&mut self, writes: usize) {
        self.fault_after = Some(writes);
    }

    /// Mark the register window unreachable; every access fails.
    pub fn disconnect(&mut self) {
        self.ready = false;
    }

    /// Pending (shadow) value of a configuration register.
    pub fn shadow(&self, reg: Register) -> u32 {
        self.shadow[slot(reg)]
    }

    /// In-effect (active) value of a configuration register.
    pub fn active(&self, reg: Register) -> u32 {
        self.active[slot(reg)]
    }

    /// Current run/enable bits.
    pub fn run_bits(&self) -> u32 {
        self.run
    }

    /// Declared arbitrary-waveform depth.
    pub fn arb_depth(&self) -> u32 {
        self.arb_depth
    }

    /// Arbitrary sample memory.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Number of reconfigure commits seen.
    pub fn reconfig_count(&self) -> u32 {
        self.reconfig_count
    }

    /// Whether `lane` is producing output.
    pub fn is_running(&self, lane: Lane) -> bool {
        self.running & lane.flag_bit() != 0
    }

    /// Every `(offset, value)` written, in issue order.
    pub fn writes(&self) -> &[(usize, u32)] {
        &self.write_log
    }

    /// Writes to `offset` only, in issue order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.write_log
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Forget the write log.
    pub fn clear_log(&mut self) {
        self.write_log.clear();
    }

    fn check_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(WavegenError::transfer_failed("software model disconnected"))
        }
    }

    fn consume_fault(&mut self, offset: usize) -> Result<()> {
        match self.fault_after {
            Some(0) => {
                self.fault_after = None;
                Err(WavegenError::transfer_failed(format!(
                    "injected fault writing {offset:#x}"
                )))
            }
            Some(n) => {
                self.fault_after = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn store_sample(&mut self, index: u32, word: u32) -> Result<()> {
        let limit = self.samples.len();
        let cell = self
            .samples
            .get_mut(index as usize)
            .ok_or_else(|| WavegenError::transfer_failed(format!(
                "sample index {index} beyond modelled memory ({limit} words)"
            )))?;
        // Port is 16 bits wide; upper bits are dropped by the hardware.
        *cell = (word & 0xFFFF) as u16;
        Ok(())
    }

    fn status_bits(&self) -> u32 {
        let mut bits = 0;
        if self.ready {
            bits |= regs::status::READY;
        }
        let busy = self.busy_remaining.get();
        if busy > 0 {
            bits |= regs::status::RECONFIG_BUSY;
            self.busy_remaining.set(busy - 1);
        }
        for lane in Lane::ALL {
            if self.is_running(lane) {
                bits |= regs::status::running(lane);
            }
        }
        bits
    }

    fn commit(&mut self) {
        for reg in Register::ALL.into_iter().filter(|r| r.is_shadowed()) {
            self.active[slot(reg)] = self.shadow[slot(reg)];
        }
        self.reconfig_count += 1;
        self.busy_remaining.set(self.reconfig_latency);
        tracing::trace!("model: shadow -> active (commit #{})", self.reconfig_count);
    }
}

const fn slot(reg: Register) -> usize {
    reg.offset() / 4
}

/// Sample index for offsets past the control block that fall in the data window.
fn window_index(offset: usize) -> Option<u32> {
    if offset > regs::SOFT_RST && offset % 4 == 0 {
        u32::try_from((offset - regs::ARB_DATA) / 4).ok()
    } else {
        None
    }
}

impl RegisterBackend for SoftwareBackend {
    fn open(_config: &DriverConfig) -> Result<Self> {
        tracing::info!("Software backend: in-memory waveform generator model");
        Ok(Self::new())
    }

    fn read_register(&self, offset: usize) -> Result<u32> {
        self.check_ready()?;
        let value = match Register::at(offset) {
            Some(Register::Status) => self.status_bits(),
            Some(Register::Run) => self.run,
            Some(Register::ArbDepth) => self.arb_depth,
            Some(Register::ArbData) => u32::from(self.samples[0]),
            Some(Register::Reconfig | Register::Trigger | Register::SoftReset) => 0,
            Some(reg) => self.shadow[slot(reg)],
            None => match window_index(offset) {
                Some(index) => self
                    .samples
                    .get(index as usize)
                    .map(|&s| u32::from(s))
                    .ok_or_else(|| {
                        WavegenError::transfer_failed(format!("read outside model: {offset:#x}"))
                    })?,
                None => {
                    return Err(WavegenError::transfer_failed(format!(
                        "unaligned or unmapped read: {offset:#x}"
                    )))
                }
            },
        };
        tracing::trace!("model: read  {offset:#04x} = {value:#010x}");
        Ok(value)
    }

    fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check_ready()?;
        self.consume_fault(offset)?;
        tracing::trace!("model: write {offset:#04x} = {value:#010x}");

        match Register::at(offset) {
            Some(Register::Run) => {
                self.run = value & 0b11;
                self.running &= self.run;
            }
            Some(Register::ArbDepth) => self.arb_depth = value,
            Some(Register::ArbData) => self.store_sample(0, value)?,
            Some(Register::Reconfig) => self.commit(),
            Some(Register::Status) => {
                tracing::trace!("model: write to read-only STATUS ignored");
            }
            Some(Register::Trigger) => self.running |= value & self.run & 0b11,
            Some(Register::SoftReset) => self.running &= !(value & 0b11),
            Some(reg) => self.shadow[slot(reg)] = value,
            None => {
                let index = window_index(offset).ok_or_else(|| {
                    WavegenError::transfer_failed(format!("unaligned or unmapped write: {offset:#x}"))
                })?;
                self.store_sample(index, value)?;
            }
        }

        self.write_log.push((offset, value));
        Ok(())
    }

    fn write_arb_sample(&mut self, index: u32, word: u32) -> Result<()> {
        // Dedicated sample port: samples 1..=4 alias control offsets in the
        // flat address formula, so the model stores them without decoding.
        self.check_ready()?;
        let offset = regs::arb_sample_offset(index);
        self.consume_fault(offset)?;
        self.store_sample(index, word)?;
        self.write_log.push((offset, word));
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let model = SoftwareBackend::new();
        assert_eq!(model.read_register(regs::STATUS).unwrap(), regs::status::READY);
        assert_eq!(model.read_register(regs::MODE).unwrap(), 0);
        assert!(model.is_ready());
    }

    #[test]
    fn configuration_writes_stay_in_shadow_until_commit() {
        let mut model = SoftwareBackend::new();
        model.write_register(regs::FREQ_A, 10_000_000).unwrap();
        assert_eq!(model.shadow(Register::FrequencyA), 10_000_000);
        assert_eq!(model.active(Register::FrequencyA), 0);
        assert_eq!(model.read_register(regs::FREQ_A).unwrap(), 10_000_000);

        model.write_register(regs::RECONFIG, 1).unwrap();
        assert_eq!(model.active(Register::FrequencyA), 10_000_000);
        assert_eq!(model.reconfig_count(), 1);
    }

    #[test]
    fn trigger_starts_only_enabled_lanes() {
        let mut model = SoftwareBackend::new();
        model.write_register(regs::RUN, 0b01).unwrap();
        model.write_register(regs::TRIGGER, 0b11).unwrap();
        assert!(model.is_running(Lane::A));
        assert!(!model.is_running(Lane::B));

        let status = model.read_register(regs::STATUS).unwrap();
        assert_ne!(status & regs::status::CHA_RUNNING, 0);
        assert_eq!(status & regs::status::CHB_RUNNING, 0);

        model.write_register(regs::SOFT_RST, 0b01).unwrap();
        assert!(!model.is_running(Lane::A));
    }

    #[test]
    fn disabling_stops_output() {
        let mut model = SoftwareBackend::new();
        model.write_register(regs::RUN, 0b11).unwrap();
        model.write_register(regs::TRIGGER, 0b11).unwrap();
        model.write_register(regs::RUN, 0b10).unwrap();
        assert!(!model.is_running(Lane::A));
        assert!(model.is_running(Lane::B));
    }

    #[test]
    fn reconfig_latency_reports_busy() {
        let mut model = SoftwareBackend::new().with_reconfig_latency(2);
        model.write_register(regs::RECONFIG, 1).unwrap();
        let busy = |m: &SoftwareBackend| {
            m.read_register(regs::STATUS).unwrap() & regs::status::RECONFIG_BUSY != 0
        };
        assert!(busy(&model));
        assert!(busy(&model));
        assert!(!busy(&model));
    }

    #[test]
    fn sample_port_does_not_alias_control_registers() {
        let mut model = SoftwareBackend::new();
        model.write_arb_sample(1, 0xBEEF).unwrap();
        assert_eq!(model.samples()[1], 0xBEEF);
        assert_eq!(model.reconfig_count(), 0);
        assert_eq!(model.writes(), &[(regs::arb_sample_offset(1), 0xBEEF)]);
    }

    #[test]
    fn window_writes_past_control_block_are_samples() {
        let mut model = SoftwareBackend::with_arb_capacity(32);
        model.write_register(regs::arb_sample_offset(10), 0x1_2345).unwrap();
        assert_eq!(model.samples()[10], 0x2345);
        assert!(model.write_arb_sample(32, 0).is_err());
        assert!(model.write_register(0x3D, 0).is_err());
    }

    #[test]
    fn injected_fault_fails_exactly_one_write() {
        let mut model = SoftwareBackend::new();
        model.fail_after_writes(1);
        model.write_register(regs::MODE, 1).unwrap();
        assert!(model.write_register(regs::MODE, 2).is_err());
        model.write_register(regs::MODE, 3).unwrap();
        assert_eq!(model.writes_to(regs::MODE), vec![1, 3]);
    }

    #[test]
    fn disconnected_model_refuses_access() {
        let mut model = SoftwareBackend::new();
        model.disconnect();
        assert!(!model.is_ready());
        assert!(model.read_register(regs::STATUS).is_err());
        assert!(model.write_register(regs::RUN, 1).is_err());
    }
}
