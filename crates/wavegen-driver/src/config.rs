// SPDX-License-Identifier: AGPL-3.0-only

//! Driver configuration
//!
//! Defaults match the reference Zynq design. Every field can be overridden
//! from the environment so that the same binary works against a kernel
//! driver node, a raw `/dev/mem` mapping, or a UIO device:
//!
//! | Variable | Field | Example |
//! |----------|-------|---------|
//! | `WAVEGEN_DEVICE` | `device_path` | `/dev/wavegen` |
//! | `WAVEGEN_MEM` | `mem_path` | `/dev/uio0` |
//! | `WAVEGEN_BASE_ADDR` | `base_addr` | `0x43c00000` |
//! | `WAVEGEN_ADDR_RANGE` | `addr_range` | `0x10000` |
//! | `WAVEGEN_BACKEND` | `backend` | `auto`, `kernel`, `mmap`, `software` |

use std::path::PathBuf;
use std::time::Duration;

use wavegen_chip::regs;

use crate::backend::BackendSelection;
use crate::error::{Result, WavegenError};

/// Default kernel driver node
pub const DEFAULT_DEVICE_PATH: &str = "/dev/wavegen";

/// Default physical memory node for direct mapping
pub const DEFAULT_MEM_PATH: &str = "/dev/mem";

/// Where and how to reach the register block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Character device exposed by the kernel driver
    pub device_path: PathBuf,
    /// Memory node mapped by the direct-MMIO backend
    pub mem_path: PathBuf,
    /// Physical base address of the IP (offset into `mem_path`)
    pub base_addr: u64,
    /// Bytes to map
    pub addr_range: usize,
    /// Backend selection strategy
    pub backend: BackendSelection,
    /// Reconfigure-busy polling bounds
    pub poll: PollConfig,
}

/// Bounds for polling `reconfig_busy` after an apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum status reads before giving up
    pub max_attempts: u32,
    /// Sleep between reads (zero = busy re-read)
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            interval: Duration::from_micros(10),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            mem_path: PathBuf::from(DEFAULT_MEM_PATH),
            base_addr: regs::BASE_ADDR,
            addr_range: regs::ADDR_RANGE,
            backend: BackendSelection::Auto,
            poll: PollConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by `WAVEGEN_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("WAVEGEN_DEVICE") {
            config.device_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("WAVEGEN_MEM") {
            config.mem_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("WAVEGEN_BASE_ADDR") {
            config.base_addr = parse_u64(&addr).ok_or_else(|| {
                WavegenError::invalid_parameter(format!("WAVEGEN_BASE_ADDR: cannot parse '{addr}'"))
            })?;
        }
        if let Some(range) = lookup("WAVEGEN_ADDR_RANGE") {
            config.addr_range = parse_u64(&range)
                .and_then(|r| usize::try_from(r).ok())
                .ok_or_else(|| {
                    WavegenError::invalid_parameter(format!(
                        "WAVEGEN_ADDR_RANGE: cannot parse '{range}'"
                    ))
                })?;
        }
        if let Some(backend) = lookup("WAVEGEN_BACKEND") {
            config.backend = backend.parse()?;
        }

        tracing::debug!("Driver config: {config:?}");
        Ok(config)
    }
}

/// Parse `0x`-prefixed hex or plain decimal.
pub fn parse_u64(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => text.replace('_', "").parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_design() {
        let config = DriverConfig::default();
        assert_eq!(config.base_addr, 0x43C0_0000);
        assert_eq!(config.addr_range, 0x1_0000);
        assert_eq!(config.device_path, PathBuf::from("/dev/wavegen"));
        assert_eq!(config.backend, BackendSelection::Auto);
    }

    #[test]
    fn environment_overrides() {
        let config = DriverConfig::from_lookup(lookup(&[
            ("WAVEGEN_MEM", "/dev/uio0"),
            ("WAVEGEN_BASE_ADDR", "0x8000_0000"),
            ("WAVEGEN_ADDR_RANGE", "4096"),
            ("WAVEGEN_BACKEND", "software"),
        ]))
        .unwrap();
        assert_eq!(config.mem_path, PathBuf::from("/dev/uio0"));
        assert_eq!(config.base_addr, 0x8000_0000);
        assert_eq!(config.addr_range, 4096);
        assert_eq!(config.backend, BackendSelection::Software);
        assert_eq!(config.device_path, PathBuf::from(DEFAULT_DEVICE_PATH));
    }

    #[test]
    fn unparsable_values_are_invalid_parameters() {
        let err = DriverConfig::from_lookup(lookup(&[("WAVEGEN_BASE_ADDR", "0xZZ")])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);

        let err = DriverConfig::from_lookup(lookup(&[("WAVEGEN_BACKEND", "vfio")])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);
    }

    #[test]
    fn parse_u64_accepts_hex_and_decimal() {
        assert_eq!(parse_u64("0x43C00000"), Some(0x43C0_0000));
        assert_eq!(parse_u64(" 65536 "), Some(65536));
        assert_eq!(parse_u64("0X10"), Some(16));
        assert_eq!(parse_u64("ten"), None);
    }
}
