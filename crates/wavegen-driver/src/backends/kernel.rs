// SPDX-License-Identifier: AGPL-3.0-only

//! Kernel backend
//!
//! Talks to the privileged waveform generator driver through ioctls on its
//! character device (default `/dev/wavegen`). The driver owns the `ioremap`
//! of the register block and performs the MMIO on our behalf; every
//! structure below is copied across the boundary by the kernel.
//!
//! Bulk sample loads cross the boundary in bounded chunks: each
//! `SET_ARB_BULK` carries at most [`BULK_CHUNK_WORDS`] words, which the
//! driver copies into one kernel allocation and replays as single-sample
//! register writes.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use crate::backend::{BackendType, RegisterBackend};
use crate::config::DriverConfig;
use crate::error::{Result, WavegenError};

/// Largest block handed to one `SET_ARB_BULK` ioctl.
pub const BULK_CHUNK_WORDS: usize = 4096;

/// Register peek/poke argument.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct RegAccess {
    offset: u32,
    value: u32,
}

/// Single arbitrary sample argument.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct ArbSample {
    index: u32,
    value: u32,
}

/// Bulk arbitrary sample argument; `data` points at `count` words in our
/// address space.
#[repr(C)]
#[derive(Debug)]
struct ArbBulk {
    start_offset: u32,
    count: u32,
    data: *const u32,
}

/// Waveform generator ioctl numbers (magic `'w'`)
///
/// Encoded as the generic Linux `_IOC(dir, type, nr, size)`:
/// `dir << 30 | size << 16 | type << 8 | nr`.
mod ioctls {
    use super::{ArbBulk, ArbSample, RegAccess};
    use libc::c_ulong;
    use std::mem::size_of;

    const IOC_WRITE: c_ulong = 1;
    const IOC_READ: c_ulong = 2;

    pub const WAVEGEN_MAGIC: u8 = b'w';

    const fn ioc(dir: c_ulong, nr: u8, size: usize) -> c_ulong {
        (dir << 30) | ((size as c_ulong) << 16) | ((WAVEGEN_MAGIC as c_ulong) << 8) | nr as c_ulong
    }

    pub const SET_ARB_DATA: c_ulong = ioc(IOC_WRITE, 10, size_of::<ArbSample>());
    pub const SET_ARB_BULK: c_ulong = ioc(IOC_WRITE, 11, size_of::<ArbBulk>());
    pub const READ_REG: c_ulong = ioc(IOC_READ | IOC_WRITE, 16, size_of::<RegAccess>());
    pub const WRITE_REG: c_ulong = ioc(IOC_WRITE, 17, size_of::<RegAccess>());
}

/// Kernel driver backend
///
/// Uses the /dev/wavegen device node exposed by the kernel module
#[derive(Debug)]
pub struct KernelBackend {
    file: File,
    path: std::path::PathBuf,
}

impl KernelBackend {
    fn ioctl<T>(&self, request: libc::c_ulong, arg: &mut T, what: &str) -> Result<()> {
        // SAFETY: ioctl on the waveform generator node.
        // Invariants: (1) fd is open for the lifetime of self.file; (2) arg is a
        // #[repr(C)] struct whose size is encoded in `request`; (3) the driver
        // reads (and for READ_REG writes) exactly that many bytes through the
        // pointer, which stays valid for the call.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), request, std::ptr::from_mut(arg)) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            tracing::debug!("{what} ioctl on {} failed: {err}", self.path.display());
            return Err(err.into());
        }
        Ok(())
    }

    fn offset_u32(offset: usize) -> Result<u32> {
        u32::try_from(offset).map_err(|_| {
            WavegenError::transfer_failed(format!("register offset {offset:#x} exceeds 32 bits"))
        })
    }
}

impl RegisterBackend for KernelBackend {
    fn open(config: &DriverConfig) -> Result<Self> {
        let path = config.device_path.clone();
        tracing::debug!("Opening kernel driver node {}", path.display());

        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        tracing::info!("Kernel backend initialized: {}", path.display());
        Ok(Self { file, path })
    }

    fn read_register(&self, offset: usize) -> Result<u32> {
        let mut access = RegAccess {
            offset: Self::offset_u32(offset)?,
            value: 0,
        };
        self.ioctl(ioctls::READ_REG, &mut access, "READ_REG")?;
        tracing::trace!("Read u32 @ {offset:#x} = {:#x}", access.value);
        Ok(access.value)
    }

    fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        let mut access = RegAccess {
            offset: Self::offset_u32(offset)?,
            value,
        };
        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");
        self.ioctl(ioctls::WRITE_REG, &mut access, "WRITE_REG")
    }

    fn write_arb_sample(&mut self, index: u32, word: u32) -> Result<()> {
        let mut sample = ArbSample { index, value: word };
        self.ioctl(ioctls::SET_ARB_DATA, &mut sample, "SET_ARB_DATA")
    }

    fn write_arb_block(&mut self, start: u32, words: &[u32]) -> Result<()> {
        let mut index = start;
        for chunk in words.chunks(BULK_CHUNK_WORDS) {
            // chunk.len() <= BULK_CHUNK_WORDS, fits u32
            #[allow(clippy::cast_possible_truncation)]
            let count = chunk.len() as u32;
            let mut bulk = ArbBulk {
                start_offset: index,
                count,
                data: chunk.as_ptr(),
            };
            self.ioctl(ioctls::SET_ARB_BULK, &mut bulk, "SET_ARB_BULK")?;
            tracing::trace!("Bulk transferred {count} samples at index {index}");
            index = index
                .checked_add(count)
                .ok_or_else(|| WavegenError::out_of_range(u64::from(index) + u64::from(count), u32::MAX))?;
        }
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Kernel
    }

    fn is_ready(&self) -> bool {
        true // Kernel driver owns the mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ioctl_numbers_follow_linux_encoding() {
        // _IOW('w', 17, 8 bytes)
        assert_eq!(ioctls::WRITE_REG, 0x4008_7711);
        // _IOWR('w', 16, 8 bytes)
        assert_eq!(ioctls::READ_REG, 0xC008_7710);
        // _IOW('w', 10, 8 bytes)
        assert_eq!(ioctls::SET_ARB_DATA, 0x4008_770A);
    }

    #[test]
    fn bulk_argument_matches_driver_layout() {
        assert_eq!(
            std::mem::size_of::<ArbBulk>(),
            8 + std::mem::size_of::<*const u32>().max(4)
        );
    }

    #[test]
    fn missing_node_is_io_failure() {
        let config = DriverConfig {
            device_path: "/nonexistent/wavegen".into(),
            ..DriverConfig::default()
        };
        let err = KernelBackend::open(&config).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::IoFailure);
    }

    #[test]
    #[ignore] // Requires hardware and the kernel module
    fn read_status_through_driver() {
        let backend = KernelBackend::open(&DriverConfig::default()).expect("open /dev/wavegen");
        let status = backend
            .read_register(wavegen_chip::regs::STATUS)
            .expect("READ_REG");
        println!("status = {status:#x}");
    }
}
