// SPDX-License-Identifier: AGPL-3.0-only

//! Direct memory-mapped backend
//!
//! Two ways to obtain the register window:
//! - [`MmapBackend::open`] maps `addr_range` bytes at `base_addr` from a
//!   memory node (`/dev/mem`, or a UIO device with offset 0) using `O_SYNC`
//!   so the mapping is uncached.
//! - [`MmapBackend::from_raw_parts`] wraps a base pointer that is already
//!   valid, for bare-metal targets where the IP sits at a fixed physical
//!   address and no operating system is involved.
//!
//! Accesses are volatile 32-bit loads and stores, bounds-checked against
//! the window size; an out-of-window access is an error, never a panic.
//!
//! Deep Debt Principles:
//! - Minimal unsafe (mapping, volatile access, unmap), each block documented
//! - Runtime validation (bounds, alignment)

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::ptr::NonNull;

use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};

use crate::backend::{BackendType, RegisterBackend};
use crate::config::DriverConfig;
use crate::error::{Result, WavegenError};

/// Volatile access to a mapped register window
#[derive(Debug)]
pub struct MmapBackend {
    ptr: NonNull<u8>,
    size: usize,
    /// Keeps the fd open for the mapping's lifetime; `None` for raw windows
    file: Option<File>,
    base_addr: u64,
}

impl MmapBackend {
    /// Wrap an already-valid register window (bare-metal)
    ///
    /// # Safety
    ///
    /// `base` must point to `size` bytes of device memory that stays mapped
    /// and is not accessed through any other Rust reference for the lifetime
    /// of the returned value. `base` must be 4-byte aligned.
    pub unsafe fn from_raw_parts(base: NonNull<u8>, size: usize) -> Self {
        tracing::debug!("Wrapping raw register window at {base:p} ({size:#x} bytes)");
        Self {
            ptr: base,
            size,
            file: None,
            base_addr: base.as_ptr() as u64,
        }
    }

    /// Size of the window in bytes
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Physical (or raw) base address of the window
    #[must_use]
    pub const fn base_addr(&self) -> u64 {
        self.base_addr
    }

    fn check_bounds(&self, offset: usize, op: &str) -> Result<()> {
        if offset % 4 != 0 {
            return Err(WavegenError::transfer_failed(format!(
                "Unaligned {op}: offset={offset:#x}"
            )));
        }
        if offset.checked_add(4).map_or(true, |end| end > self.size) {
            return Err(WavegenError::transfer_failed(format!(
                "Out of bounds {op}: offset={offset:#x}, limit={:#x}",
                self.size
            )));
        }
        Ok(())
    }
}

impl RegisterBackend for MmapBackend {
    fn open(config: &DriverConfig) -> Result<Self> {
        let path = &config.mem_path;
        let size = config.addr_range;

        if size == 0 {
            return Err(WavegenError::invalid_parameter("addr_range is 0"));
        }

        tracing::debug!(
            "Mapping {size:#x} bytes at {:#x} from {}",
            config.base_addr,
            path.display()
        );

        // SAFETY: OFlags::SYNC.bits() is a small positive flag value that fits in i32
        #[allow(clippy::cast_possible_wrap)]
        let sync_flag = OFlags::SYNC.bits() as i32;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(sync_flag)
            .open(path)
            .map_err(|e| {
                WavegenError::transfer_failed(format!(
                    "Cannot open {}: {e}. Running as root?",
                    path.display()
                ))
            })?;

        // SAFETY: mmap of device memory for MMIO.
        // Invariants that hold:
        // - fd is valid (just opened) and kept alive in `self.file`
        // - size is non-zero (checked above)
        // - MAP_SHARED so stores reach the device, O_SYNC on the fd disables caching
        // - rustix returns Err on failure, so the pointer is only used on success
        // - The mapping is released exactly once in Drop
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                config.base_addr,
            )
        }
        .map_err(|e| WavegenError::transfer_failed(format!("mmap failed: {e}")))?;

        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| WavegenError::transfer_failed("mmap returned a null mapping"))?;

        tracing::info!(
            "Mapped waveform generator registers {:#x}..{:#x} at {ptr:p}",
            config.base_addr,
            config.base_addr + size as u64
        );

        Ok(Self {
            ptr,
            size,
            file: Some(file),
            base_addr: config.base_addr,
        })
    }

    fn read_register(&self, offset: usize) -> Result<u32> {
        self.check_bounds(offset, "read")?;

        // SAFETY: Volatile read from a memory-mapped hardware register.
        // - offset is 4-byte aligned and offset + 4 <= size (checked above)
        // - ptr is valid for size bytes (from mmap or the from_raw_parts contract)
        // - read_volatile: status bits change under us, the read must not be elided
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };

        tracing::trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check_bounds(offset, "write")?;

        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");

        // SAFETY: Volatile write to a memory-mapped hardware register.
        // - offset is 4-byte aligned and offset + 4 <= size (checked above)
        // - ptr is valid for size bytes; &mut self gives exclusive access
        // - write_volatile: strobes (RECONFIG, TRIGGER) act on the store itself
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            self.ptr.as_ptr().add(offset).cast::<u32>().write_volatile(value);
        }

        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Mmap
    }

    fn is_ready(&self) -> bool {
        true
    }
}

impl Drop for MmapBackend {
    fn drop(&mut self) {
        if self.file.is_none() {
            return;
        }

        tracing::debug!("Unmapping register window at {:#x}", self.base_addr);

        // SAFETY: munmap of the region created in open().
        // - ptr and size are exactly what mmap returned / was given
        // - Drop runs at most once, no references into the mapping outlive self
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.size) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: Send - MmapBackend owns the mapping exclusively; moving it between
// threads does not invalidate a process-wide mapping. No thread-local state.
unsafe impl Send for MmapBackend {}

#[cfg(test)]
mod tests {
    use super::*;
    use wavegen_chip::regs;

    fn heap_window(words: &mut [u32]) -> MmapBackend {
        let base = NonNull::new(words.as_mut_ptr().cast::<u8>()).unwrap();
        // SAFETY: `words` outlives the backend in every test and is only
        // touched through it.
        unsafe { MmapBackend::from_raw_parts(base, words.len() * 4) }
    }

    #[test]
    fn raw_window_round_trip() {
        let mut words = [0u32; 16];
        let mut backend = heap_window(&mut words);
        backend.write_register(regs::AMPLITUDE, 0x7FFF_0001).unwrap();
        assert_eq!(backend.read_register(regs::AMPLITUDE).unwrap(), 0x7FFF_0001);
        drop(backend);
        assert_eq!(words[regs::AMPLITUDE / 4], 0x7FFF_0001);
    }

    #[test]
    fn out_of_window_access_is_an_error() {
        let mut words = [0u32; 4];
        let mut backend = heap_window(&mut words);
        assert!(backend.read_register(16).is_err());
        assert!(backend.write_register(usize::MAX - 1, 0).is_err());
        assert!(backend.read_register(2).is_err());
    }

    #[test]
    #[ignore] // Requires hardware and root
    fn map_reference_design() {
        let backend = MmapBackend::open(&DriverConfig::default()).expect("map /dev/mem");
        let status = backend.read_register(regs::STATUS).expect("read status");
        assert_ne!(status & regs::status::READY, 0, "core not ready: {status:#x}");
    }
}
