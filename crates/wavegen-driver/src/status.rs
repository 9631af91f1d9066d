// SPDX-License-Identifier: AGPL-3.0-only

//! Status register decode and reconfigure polling

use std::fmt;
use std::thread;

use tracing::{debug, warn};
use wavegen_chip::regs::status;
use wavegen_chip::Lane;

use crate::backend::RegisterBackend;
use crate::config::PollConfig;
use crate::engine::Wavegen;
use crate::error::{Result, WavegenError};

/// Decoded status register. Always a fresh read; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Core is out of reset and accepting writes
    pub ready: bool,
    /// Shadow → active copy still in progress
    pub reconfig_busy: bool,
    /// Channel A producing output
    pub channel_a_running: bool,
    /// Channel B producing output
    pub channel_b_running: bool,
    /// Undecoded register value
    pub raw: u32,
}

impl Status {
    /// Decode a raw status word
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            ready: raw & status::READY != 0,
            reconfig_busy: raw & status::RECONFIG_BUSY != 0,
            channel_a_running: raw & status::CHA_RUNNING != 0,
            channel_b_running: raw & status::CHB_RUNNING != 0,
            raw,
        }
    }

    /// Running flag for `lane`
    #[must_use]
    pub const fn is_running(&self, lane: Lane) -> bool {
        match lane {
            Lane::A => self.channel_a_running,
            Lane::B => self.channel_b_running,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "ready={} reconfig_busy={} a_running={} b_running={} (raw {:#010x})",
            flag(self.ready),
            flag(self.reconfig_busy),
            flag(self.channel_a_running),
            flag(self.channel_b_running),
            self.raw
        )
    }
}

/// Poll status until `reconfig_busy` clears
///
/// Sleeps `poll.interval` between reads (no sleep when zero). Returns the
/// first non-busy status.
///
/// # Errors
///
/// `Timeout` after `poll.max_attempts` busy reads; otherwise as
/// [`Wavegen::get_status`].
pub fn wait_for_reconfig<B: RegisterBackend>(wavegen: &Wavegen<B>, poll: &PollConfig) -> Result<Status> {
    for attempt in 1..=poll.max_attempts {
        let status = wavegen.get_status()?;
        if !status.reconfig_busy {
            debug!("Reconfigure settled after {attempt} poll(s)");
            return Ok(status);
        }
        if !poll.interval.is_zero() {
            thread::sleep(poll.interval);
        }
    }
    warn!("Reconfigure still busy after {} polls", poll.max_attempts);
    Err(WavegenError::Timeout {
        attempts: poll.max_attempts,
    })
}
