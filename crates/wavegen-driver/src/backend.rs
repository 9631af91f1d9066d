// SPDX-License-Identifier: AGPL-3.0-only

//! Register-access capability
//!
//! The engine never touches hardware directly. Everything it needs is a
//! point-in-time 32-bit read and a 32-bit write at a byte offset from the
//! IP base; each backend decides how those cross the boundary:
//!
//! ```text
//! KernelBackend    ioctl on /dev/wavegen (privileged driver performs MMIO)
//! MmapBackend      volatile access to a mapped or bare-metal window
//! SoftwareBackend  in-memory model of the IP (tests, CI)
//! ```

use std::fmt::Debug;

use wavegen_chip::regs;

use crate::config::DriverConfig;
use crate::error::{Result, WavegenError};

/// Register-level access to one waveform generator instance
///
/// Reads are never cached by callers: every read-modify-write in the engine
/// issues a fresh `read_register` immediately before its write.
pub trait RegisterBackend: Debug + Send {
    /// Open the backend described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the device node or memory window cannot be opened.
    fn open(config: &DriverConfig) -> Result<Self>
    where
        Self: Sized;

    /// Read the 32-bit register at byte `offset`
    ///
    /// # Errors
    ///
    /// Returns error if the access fails or is out of bounds.
    fn read_register(&self, offset: usize) -> Result<u32>;

    /// Write the 32-bit register at byte `offset`
    ///
    /// # Errors
    ///
    /// Returns error if the access fails or is out of bounds.
    fn write_register(&mut self, offset: usize, value: u32) -> Result<()>;

    /// Write one arbitrary-waveform sample word
    ///
    /// # Errors
    ///
    /// Returns error if the underlying write fails.
    fn write_arb_sample(&mut self, index: u32, word: u32) -> Result<()> {
        self.write_register(regs::arb_sample_offset(index), word)
    }

    /// Write a staged block of sample words starting at `start`
    ///
    /// This is the single boundary hop for a bulk load. The default replays
    /// the block as single-sample writes in ascending index order and stops
    /// at the first failure.
    ///
    /// # Errors
    ///
    /// Returns error if any sample write fails, or if `start + words.len()`
    /// does not fit the 32-bit index space.
    fn write_arb_block(&mut self, start: u32, words: &[u32]) -> Result<()> {
        for (i, &word) in words.iter().enumerate() {
            let index = u32::try_from(i)
                .ok()
                .and_then(|i| start.checked_add(i))
                .ok_or_else(|| WavegenError::out_of_range(u64::from(start) + i as u64, u32::MAX))?;
            self.write_arb_sample(index, word)?;
        }
        Ok(())
    }

    /// Backend type for debugging
    fn backend_type(&self) -> BackendType;

    /// Whether the register window is currently reachable
    fn is_ready(&self) -> bool;
}

impl<B: RegisterBackend + ?Sized> RegisterBackend for Box<B> {
    fn open(_config: &DriverConfig) -> Result<Self> {
        Err(WavegenError::invalid_parameter(
            "a boxed backend is opened through select_backend()",
        ))
    }

    fn read_register(&self, offset: usize) -> Result<u32> {
        (**self).read_register(offset)
    }

    fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        (**self).write_register(offset, value)
    }

    fn write_arb_sample(&mut self, index: u32, word: u32) -> Result<()> {
        (**self).write_arb_sample(index, word)
    }

    fn write_arb_block(&mut self, start: u32, words: &[u32]) -> Result<()> {
        (**self).write_arb_block(start, words)
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Kernel driver (`/dev/wavegen` ioctls)
    Kernel,

    /// Direct memory-mapped registers (`/dev/mem`, UIO, or bare-metal base)
    Mmap,

    /// Software model of the IP, no hardware required
    Software,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kernel => write!(f, "Kernel"),
            Self::Mmap => write!(f, "Mmap"),
            Self::Software => write!(f, "Software (model)"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendSelection {
    /// Kernel driver if present, else direct mapping
    #[default]
    Auto,

    /// Force kernel driver
    Kernel,

    /// Force direct memory mapping
    Mmap,

    /// Force the software model
    Software,
}

impl std::str::FromStr for BackendSelection {
    type Err = WavegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "kernel" => Ok(Self::Kernel),
            "mmap" | "mmio" => Ok(Self::Mmap),
            "software" | "sim" => Ok(Self::Software),
            other => Err(WavegenError::invalid_parameter(format!(
                "unknown backend '{other}' (expected auto, kernel, mmap or software)"
            ))),
        }
    }
}

/// Select appropriate backend based on availability
///
/// # Errors
///
/// Returns error if no suitable backend can be opened.
pub fn select_backend(
    selection: BackendSelection,
    config: &DriverConfig,
) -> Result<Box<dyn RegisterBackend>> {
    use crate::backends::{KernelBackend, MmapBackend, SoftwareBackend};

    match selection {
        BackendSelection::Auto => {
            match KernelBackend::open(config) {
                Ok(backend) => {
                    tracing::info!("Using kernel backend at {}", config.device_path.display());
                    return Ok(Box::new(backend));
                }
                Err(e) => tracing::debug!("Kernel backend unavailable: {e}"),
            }

            tracing::info!(
                "Kernel driver unavailable, mapping {:#x} via {}",
                config.base_addr,
                config.mem_path.display()
            );
            MmapBackend::open(config).map(|b| Box::new(b) as Box<dyn RegisterBackend>)
        }

        BackendSelection::Kernel => {
            KernelBackend::open(config).map(|b| Box::new(b) as Box<dyn RegisterBackend>)
        }

        BackendSelection::Mmap => {
            MmapBackend::open(config).map(|b| Box::new(b) as Box<dyn RegisterBackend>)
        }

        BackendSelection::Software => {
            SoftwareBackend::open(config).map(|b| Box::new(b) as Box<dyn RegisterBackend>)
        }
    }
}
