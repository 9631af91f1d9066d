// SPDX-License-Identifier: AGPL-3.0-only

//! Shadow configuration engine
//!
//! Parameter setters stage values in the IP's shadow bank; nothing reaches
//! the running waveform until [`Wavegen::apply`] strobes the reconfigure
//! register, which copies shadow → active for both lanes at once. That
//! strobe is the only atomicity guarantee: individual setters are not
//! atomic with respect to each other.
//!
//! Enable, trigger and soft reset bypass the shadow bank and act at once.
//!
//! The engine performs no locking. Packed registers are updated by
//! read-modify-write, so two unsynchronised writers can lose each other's
//! updates; share an engine behind a `Mutex` or give each process exclusive
//! ownership of the device.

use tracing::{debug, info};
use wavegen_chip::regs::{self, Register};
use wavegen_chip::{Lane, PackedField, WaveformMode};

use crate::backend::RegisterBackend;
use crate::channel::{resolve, Channel};
use crate::config::DriverConfig;
use crate::error::{Result, WavegenError};
use crate::params::{ChannelParameters, Preset, PHASE_LIMIT};
use crate::status::Status;

/// Dual-channel waveform generator over a register backend
#[derive(Debug)]
pub struct Wavegen<B: RegisterBackend> {
    regs: Option<B>,
    shadow: [ChannelParameters; 2],
    applied: [ChannelParameters; 2],
}

impl<B: RegisterBackend> Wavegen<B> {
    /// Engine bound to `backend`, shadow record at power-on defaults
    pub fn new(backend: B) -> Self {
        Self {
            regs: Some(backend),
            shadow: [ChannelParameters::default(); 2],
            applied: [ChannelParameters::default(); 2],
        }
    }

    /// Engine with no register handle; every operation fails with
    /// `NotInitialized` until [`attach`](Self::attach)
    pub fn detached() -> Self {
        Self {
            regs: None,
            shadow: [ChannelParameters::default(); 2],
            applied: [ChannelParameters::default(); 2],
        }
    }

    /// Open `B` from `config` and bind it
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be opened.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        let backend = B::open(config)?;
        info!("Waveform generator attached ({})", backend.backend_type());
        Ok(Self::new(backend))
    }

    /// Bind a new backend, returning the previous one
    ///
    /// The shadow record restarts at power-on defaults.
    pub fn attach(&mut self, backend: B) -> Option<B> {
        self.shadow = [ChannelParameters::default(); 2];
        self.applied = [ChannelParameters::default(); 2];
        self.regs.replace(backend)
    }

    /// Release the backend; later operations fail with `NotInitialized`
    pub fn close(&mut self) -> Option<B> {
        let backend = self.regs.take();
        if let Some(b) = &backend {
            info!("Waveform generator detached ({})", b.backend_type());
        }
        backend
    }

    /// Whether a register handle is bound
    pub fn is_initialized(&self) -> bool {
        self.regs.is_some()
    }

    /// Bound backend
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no backend is bound.
    pub fn backend(&self) -> Result<&B> {
        self.regs.as_ref().ok_or(WavegenError::NotInitialized)
    }

    /// Bound backend, mutably
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if no backend is bound.
    pub fn backend_mut(&mut self) -> Result<&mut B> {
        self.regs.as_mut().ok_or(WavegenError::NotInitialized)
    }

    /// Pending parameters for `lane` (staged, not necessarily applied)
    pub fn shadow(&self, lane: Lane) -> &ChannelParameters {
        &self.shadow[lane.index()]
    }

    /// Parameters as of the last successful [`apply`](Self::apply)
    pub fn applied(&self, lane: Lane) -> &ChannelParameters {
        &self.applied[lane.index()]
    }

    /// Fresh read of `reg`, repack `lane`'s field, write back
    fn update_packed(&mut self, reg: Register, field: PackedField, lane: Lane, value: u32) -> Result<()> {
        let backend = self.backend_mut()?;
        let offset = reg.offset();
        let current = backend.read_register(offset)?;
        backend.write_register(offset, field.pack(current, lane, value))
    }

    // ── Shadowed parameters ──────────────────────────────────────────────────

    /// Stage the waveform mode
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_mode(&mut self, channel: Channel, mode: WaveformMode) -> Result<()> {
        self.backend()?;
        for (lane, mode) in resolve(channel, mode) {
            self.update_packed(Register::Mode, PackedField::MODE, lane, mode.raw())?;
            self.shadow[lane.index()].mode = mode;
        }
        debug!("Staged mode {mode} on {channel}");
        Ok(())
    }

    /// Stage the waveform mode from its raw code (boundary entry)
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `raw` is above `Arbitrary` (5), otherwise as
    /// [`set_mode`](Self::set_mode).
    pub fn set_mode_raw(&mut self, channel: Channel, raw: u32) -> Result<()> {
        self.backend()?;
        let mode = WaveformMode::try_from(raw)
            .map_err(|e| WavegenError::invalid_parameter(e.to_string()))?;
        self.set_mode(channel, mode)
    }

    /// Stage the frequency (100 µHz units)
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_frequency(&mut self, channel: Channel, frequency: u32) -> Result<()> {
        self.backend()?;
        for (lane, frequency) in resolve(channel, frequency) {
            self.backend_mut()?
                .write_register(Register::frequency(lane).offset(), frequency)?;
            self.shadow[lane.index()].frequency = frequency;
        }
        debug!("Staged frequency {frequency} on {channel}");
        Ok(())
    }

    /// Stage the amplitude
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_amplitude(&mut self, channel: Channel, amplitude: u16) -> Result<()> {
        self.backend()?;
        for (lane, amplitude) in resolve(channel, amplitude) {
            self.update_packed(Register::Amplitude, PackedField::HALF_WORD, lane, u32::from(amplitude))?;
            self.shadow[lane.index()].amplitude = amplitude;
        }
        debug!("Staged amplitude {amplitude} on {channel}");
        Ok(())
    }

    /// Stage the signed DC offset
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_offset(&mut self, channel: Channel, offset: i16) -> Result<()> {
        self.backend()?;
        for (lane, offset) in resolve(channel, offset) {
            self.update_packed(Register::Offset, PackedField::HALF_WORD, lane, u32::from(offset as u16))?;
            self.shadow[lane.index()].offset = offset;
        }
        debug!("Staged offset {offset} on {channel}");
        Ok(())
    }

    /// Stage the duty cycle (0–65535 ↦ 0–100 %)
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_duty_cycle(&mut self, channel: Channel, duty_cycle: u16) -> Result<()> {
        self.backend()?;
        for (lane, duty_cycle) in resolve(channel, duty_cycle) {
            self.update_packed(Register::DutyCycle, PackedField::HALF_WORD, lane, u32::from(duty_cycle))?;
            self.shadow[lane.index()].duty_cycle = duty_cycle;
        }
        debug!("Staged duty cycle {duty_cycle} on {channel}");
        Ok(())
    }

    /// Stage the phase offset (0.01° units)
    ///
    /// # Errors
    ///
    /// `InvalidParameter` outside [-18000, 18000]; `NotInitialized` without a
    /// backend; `IoFailure` if a register access fails.
    pub fn set_phase_offset(&mut self, channel: Channel, phase_offset: i16) -> Result<()> {
        self.backend()?;
        if !(-PHASE_LIMIT..=PHASE_LIMIT).contains(&phase_offset) {
            return Err(WavegenError::invalid_parameter(format!(
                "phase offset {phase_offset} outside [-{PHASE_LIMIT}, {PHASE_LIMIT}]"
            )));
        }
        for (lane, phase) in resolve(channel, phase_offset) {
            self.update_packed(Register::Phase, PackedField::HALF_WORD, lane, u32::from(phase as u16))?;
            self.shadow[lane.index()].phase_offset = phase;
        }
        debug!("Staged phase offset {phase_offset} on {channel}");
        Ok(())
    }

    /// Stage the burst cycle count (0 = continuous)
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn set_cycles(&mut self, channel: Channel, cycles: u16) -> Result<()> {
        self.backend()?;
        for (lane, cycles) in resolve(channel, cycles) {
            self.update_packed(Register::Cycles, PackedField::HALF_WORD, lane, u32::from(cycles))?;
            self.shadow[lane.index()].cycles = cycles;
        }
        debug!("Staged cycles {cycles} on {channel}");
        Ok(())
    }

    /// Stage every parameter in fixed order, then [`apply`](Self::apply)
    ///
    /// Order: mode, frequency, amplitude, offset, duty cycle, phase offset,
    /// cycles. Stops at the first failure; earlier steps stay staged and
    /// nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns the first setter's error, or the apply error.
    pub fn configure(&mut self, channel: Channel, params: &ChannelParameters) -> Result<()> {
        self.set_mode(channel, params.mode)?;
        self.set_frequency(channel, params.frequency)?;
        self.set_amplitude(channel, params.amplitude)?;
        self.set_offset(channel, params.offset)?;
        self.set_duty_cycle(channel, params.duty_cycle)?;
        self.set_phase_offset(channel, params.phase_offset)?;
        self.set_cycles(channel, params.cycles)?;
        self.apply()
    }

    /// [`configure`](Self::configure) with a built-in preset
    ///
    /// # Errors
    ///
    /// As [`configure`](Self::configure).
    pub fn apply_preset(&mut self, channel: Channel, preset: Preset) -> Result<()> {
        self.configure(channel, &preset.parameters())
    }

    /// Commit shadow → active for both lanes
    ///
    /// Does not wait for the copy to finish; poll
    /// [`get_status`](Self::get_status) (or use
    /// [`wait_for_reconfig`](crate::wait_for_reconfig)) for that.
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the strobe fails.
    pub fn apply(&mut self) -> Result<()> {
        self.backend_mut()?
            .write_register(regs::RECONFIG, regs::RECONFIG_COMMIT)?;
        self.applied = self.shadow;
        debug!("Reconfigure committed");
        Ok(())
    }

    // ── Immediate controls ───────────────────────────────────────────────────

    /// Set or clear output enable; the unselected lane keeps its bit
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if a register access fails.
    pub fn enable(&mut self, channel: Channel, on: bool) -> Result<()> {
        let backend = self.backend_mut()?;
        let current = backend.read_register(regs::RUN)?;
        let bits = channel.flag_bits();
        let next = if on { current | bits } else { current & !bits };
        backend.write_register(regs::RUN, next)?;
        debug!("Enable {channel} = {on} (run {current:#04b} -> {next:#04b})");
        Ok(())
    }

    /// Disable output
    ///
    /// # Errors
    ///
    /// As [`enable`](Self::enable).
    pub fn stop(&mut self, channel: Channel) -> Result<()> {
        self.enable(channel, false)
    }

    /// Pulse the trigger bits for `channel` (synchronised start)
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the write fails.
    pub fn trigger(&mut self, channel: Channel) -> Result<()> {
        self.backend_mut()?
            .write_register(regs::TRIGGER, channel.flag_bits())?;
        debug!("Triggered {channel}");
        Ok(())
    }

    /// Pulse soft reset for `channel` (clears phase and cycle count)
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the write fails.
    pub fn reset(&mut self, channel: Channel) -> Result<()> {
        self.backend_mut()?
            .write_register(regs::SOFT_RST, channel.flag_bits())?;
        debug!("Soft reset {channel}");
        Ok(())
    }

    /// Enable then trigger; trigger is skipped if enable fails
    ///
    /// # Errors
    ///
    /// The enable error, or the trigger error.
    pub fn start(&mut self, channel: Channel) -> Result<()> {
        self.enable(channel, true)?;
        self.trigger(channel)
    }

    /// Fresh decode of the status register
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the read fails.
    pub fn get_status(&self) -> Result<Status> {
        let raw = self.backend()?.read_register(regs::STATUS)?;
        Ok(Status::from_raw(raw))
    }
}
