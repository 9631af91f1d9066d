// SPDX-License-Identifier: AGPL-3.0-only

//! Register backend implementations
//!
//! Three backends available:
//! - **Kernel**: ioctls on `/dev/wavegen` (privileged driver does the MMIO)
//! - **Mmap**: volatile access to a mapped window (`/dev/mem`, UIO, bare-metal)
//! - **Software**: in-memory model of the IP (tests, CI, no hardware)

pub mod kernel;
pub mod mmap;
pub mod software;

pub use kernel::KernelBackend;
pub use mmap::MmapBackend;
pub use software::SoftwareBackend;
