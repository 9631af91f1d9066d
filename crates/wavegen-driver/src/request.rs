// SPDX-License-Identifier: AGPL-3.0-only

//! Boundary request set
//!
//! The fixed operation set an outer layer (character device, RPC shim,
//! CLI) drives the engine through. Channel and mode arrive as raw `u32`
//! codes and are validated here on the way in; failures come back as
//! [`WavegenError`](crate::WavegenError), which the caller maps to its own
//! convention (see [`ErrorKind::errno`](crate::ErrorKind::errno)).

use tracing::trace;

use crate::backend::RegisterBackend;
use crate::channel::Channel;
use crate::engine::Wavegen;
use crate::error::Result;
use crate::params::ChannelParameters;
use crate::status::Status;

/// One boundary operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Stage waveform mode (raw code, ≤ 5)
    SetMode { channel: u32, mode: u32 },
    /// Stage frequency (100 µHz units)
    SetFrequency { channel: u32, frequency: u32 },
    /// Stage amplitude
    SetAmplitude { channel: u32, amplitude: u16 },
    /// Stage DC offset
    SetOffset { channel: u32, offset: i16 },
    /// Stage duty cycle
    SetDutyCycle { channel: u32, duty_cycle: u16 },
    /// Stage phase offset (0.01° units)
    SetPhaseOffset { channel: u32, phase_offset: i16 },
    /// Stage burst cycle count
    SetCycles { channel: u32, cycles: u16 },
    /// Set or clear output enable
    Enable { channel: u32, on: bool },
    /// Commit shadow → active
    Apply,
    /// Pulse trigger
    Trigger { channel: u32 },
    /// Pulse soft reset
    SoftReset { channel: u32 },
    /// Read status
    GetStatus,
    /// Set arbitrary-waveform depth
    SetArbDepth { depth: u32 },
    /// Write one arbitrary sample
    SetArbSample { index: u32, value: u16 },
    /// Bulk-load arbitrary samples, then set depth
    LoadArbWaveformBulk { start_offset: u32, samples: Vec<u16> },
    /// Stage every parameter, then apply
    Configure { channel: u32, params: ChannelParameters },
    /// Enable, then trigger
    Start { channel: u32 },
}

/// Result payload of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Completed with nothing to report
    Done,
    /// Status snapshot
    Status(Status),
}

impl Request {
    /// Operation name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetMode { .. } => "set_mode",
            Self::SetFrequency { .. } => "set_frequency",
            Self::SetAmplitude { .. } => "set_amplitude",
            Self::SetOffset { .. } => "set_offset",
            Self::SetDutyCycle { .. } => "set_duty_cycle",
            Self::SetPhaseOffset { .. } => "set_phase_offset",
            Self::SetCycles { .. } => "set_cycles",
            Self::Enable { .. } => "enable",
            Self::Apply => "apply",
            Self::Trigger { .. } => "trigger",
            Self::SoftReset { .. } => "soft_reset",
            Self::GetStatus => "get_status",
            Self::SetArbDepth { .. } => "set_arb_depth",
            Self::SetArbSample { .. } => "set_arb_sample",
            Self::LoadArbWaveformBulk { .. } => "load_arb_waveform_bulk",
            Self::Configure { .. } => "configure",
            Self::Start { .. } => "start",
        }
    }

    /// Run this request against `wavegen`
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an unknown channel code, otherwise whatever
    /// the engine operation returns.
    pub fn execute<B: RegisterBackend>(&self, wavegen: &mut Wavegen<B>) -> Result<Response> {
        trace!("Request {}", self.name());
        match *self {
            Self::SetMode { channel, mode } => wavegen.set_mode_raw(Channel::try_from(channel)?, mode)?,
            Self::SetFrequency { channel, frequency } => {
                wavegen.set_frequency(Channel::try_from(channel)?, frequency)?;
            }
            Self::SetAmplitude { channel, amplitude } => {
                wavegen.set_amplitude(Channel::try_from(channel)?, amplitude)?;
            }
            Self::SetOffset { channel, offset } => wavegen.set_offset(Channel::try_from(channel)?, offset)?,
            Self::SetDutyCycle { channel, duty_cycle } => {
                wavegen.set_duty_cycle(Channel::try_from(channel)?, duty_cycle)?;
            }
            Self::SetPhaseOffset { channel, phase_offset } => {
                wavegen.set_phase_offset(Channel::try_from(channel)?, phase_offset)?;
            }
            Self::SetCycles { channel, cycles } => wavegen.set_cycles(Channel::try_from(channel)?, cycles)?,
            Self::Enable { channel, on } => wavegen.enable(Channel::try_from(channel)?, on)?,
            Self::Apply => wavegen.apply()?,
            Self::Trigger { channel } => wavegen.trigger(Channel::try_from(channel)?)?,
            Self::SoftReset { channel } => wavegen.reset(Channel::try_from(channel)?)?,
            Self::GetStatus => return wavegen.get_status().map(Response::Status),
            Self::SetArbDepth { depth } => wavegen.set_arb_depth(depth)?,
            Self::SetArbSample { index, value } => wavegen.set_arb_sample(index, value)?,
            Self::LoadArbWaveformBulk {
                start_offset,
                ref samples,
            } => wavegen.load_waveform(samples, start_offset)?,
            Self::Configure { channel, ref params } => wavegen.configure(Channel::try_from(channel)?, params)?,
            Self::Start { channel } => wavegen.start(Channel::try_from(channel)?)?,
        }
        Ok(Response::Done)
    }
}

#[cfg(test)]
mod tests {
    use wavegen_chip::regs;

    use super::*;
    use crate::backends::SoftwareBackend;
    use crate::ErrorKind;

    #[test]
    fn unknown_channel_rejected_before_write() {
        let mut wg = Wavegen::new(SoftwareBackend::new());
        let err = Request::Trigger { channel: 3 }.execute(&mut wg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(wg.backend().unwrap().writes().is_empty());
    }

    #[test]
    fn raw_mode_validated() {
        let mut wg = Wavegen::new(SoftwareBackend::new());
        let ok = Request::SetMode { channel: 2, mode: 5 };
        assert_eq!(ok.execute(&mut wg).unwrap(), Response::Done);
        let bad = Request::SetMode { channel: 0, mode: 6 };
        assert_eq!(bad.execute(&mut wg).unwrap_err().kind(), ErrorKind::InvalidParameter);
        assert_eq!(wg.backend().unwrap().shadow(wavegen_chip::Register::Mode), 0x55);
    }

    #[test]
    fn status_request_returns_snapshot() {
        let mut wg = Wavegen::new(SoftwareBackend::new());
        Request::Start { channel: 1 }.execute(&mut wg).unwrap();
        match Request::GetStatus.execute(&mut wg).unwrap() {
            Response::Status(s) => {
                assert!(s.ready);
                assert!(s.channel_b_running);
                assert!(!s.channel_a_running);
            }
            Response::Done => panic!("expected status"),
        }
    }

    #[test]
    fn bulk_request_loads_samples() {
        let mut wg = Wavegen::new(SoftwareBackend::new());
        let req = Request::LoadArbWaveformBulk {
            start_offset: 0,
            samples: vec![7, 8],
        };
        req.execute(&mut wg).unwrap();
        assert_eq!(wg.backend().unwrap().writes_to(regs::ARB_DEPTH), vec![2]);
    }

    #[test]
    fn closed_engine_reports_not_initialized() {
        let mut wg: Wavegen<SoftwareBackend> = Wavegen::detached();
        let err = Request::Apply.execute(&mut wg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
        assert_eq!(err.errno(), libc::ENODEV);
    }
}
