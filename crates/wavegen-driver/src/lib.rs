// SPDX-License-Identifier: AGPL-3.0-only

//! Driver for a dual-channel DDS waveform generator IP core.
//!
//! The core exposes one 32-bit register window. Most per-channel parameters
//! share a register (channel A in the low half, channel B in the high
//! half), and every configuration register has a shadow copy that only
//! takes effect when software strobes the reconfigure register.
//!
//! # Backend hierarchy
//!
//! ```text
//! Privileged:
//!   KernelBackend   — /dev/wavegen ioctls (kernel driver performs MMIO)
//!
//! Direct:
//!   MmapBackend     — /dev/mem or UIO mapping, or a bare-metal pointer
//!
//! Development:
//!   SoftwareBackend — in-memory model with shadow/active banks
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use wavegen_driver::{Channel, ChannelParameters, PollConfig, Wavegen, WaveformMode};
//! use wavegen_driver::backends::KernelBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut wg: Wavegen<KernelBackend> = Wavegen::open(&Default::default())?;
//!
//! wg.configure(Channel::A, &ChannelParameters::preset_1khz(WaveformMode::Sine))?;
//! wavegen_driver::wait_for_reconfig(&wg, &PollConfig::default())?;
//! wg.start(Channel::A)?;
//! println!("{}", wg.get_status()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod arb;
mod backend;
pub mod backends;
mod channel;
mod config;
mod engine;
mod error;
mod params;
mod request;
mod status;
pub mod waveform;

pub use wavegen_chip::{regs, Lane, PackedField, Register, WaveformMode};

pub use arb::MAX_ARB_SAMPLES;
pub use backend::{select_backend, BackendSelection, BackendType, RegisterBackend};
pub use channel::{resolve, Channel};
pub use config::{parse_u64, DriverConfig, PollConfig, DEFAULT_DEVICE_PATH, DEFAULT_MEM_PATH};
pub use engine::Wavegen;
pub use error::{ErrorKind, Result, WavegenError};
pub use params::{
    duty_from_percent, hz_to_units, phase_from_degrees, ChannelParameters, Preset, PHASE_LIMIT,
};
pub use request::{Request, Response};
pub use status::{wait_for_reconfig, Status};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Channel, ChannelParameters, DriverConfig, ErrorKind, Preset, RegisterBackend, Request,
        Response, Result, Status, WaveformMode, Wavegen, WavegenError,
    };
}
