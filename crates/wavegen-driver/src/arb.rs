// SPDX-License-Identifier: AGPL-3.0-only

//! Arbitrary waveform memory
//!
//! Samples are 16-bit words in a dedicated memory behind the `ARB_DATA`
//! port; `ARB_DEPTH` tells the player how many to loop over. Neither is
//! shadowed, so a load during arbitrary-mode output is visible at once.
//!
//! Bulk loads stage the whole block as 32-bit register words before the
//! boundary hop, then write samples first and depth last. A failed sample
//! write leaves depth untouched; samples already written stay written.

use tracing::{debug, trace};
use wavegen_chip::regs;

use crate::backend::RegisterBackend;
use crate::engine::Wavegen;
use crate::error::{Result, WavegenError};

/// Largest sample count accepted by one bulk load
pub const MAX_ARB_SAMPLES: usize = 4096;

/// Widen samples into register words in a freshly reserved buffer
///
/// Allocation failure is reported rather than aborting.
fn stage(samples: &[u16]) -> Result<Vec<u32>> {
    let mut words = Vec::new();
    words
        .try_reserve_exact(samples.len())
        .map_err(|_| WavegenError::AllocationFailure {
            requested: samples.len() * std::mem::size_of::<u32>(),
        })?;
    words.extend(samples.iter().map(|&s| u32::from(s)));
    Ok(words)
}

impl<B: RegisterBackend> Wavegen<B> {
    /// Set the number of samples the player loops over
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the write fails.
    pub fn set_arb_depth(&mut self, depth: u32) -> Result<()> {
        self.backend_mut()?.write_register(regs::ARB_DEPTH, depth)?;
        debug!("Arbitrary depth = {depth}");
        Ok(())
    }

    /// Write one sample at `index`
    ///
    /// # Errors
    ///
    /// `NotInitialized` without a backend; `IoFailure` if the write fails.
    pub fn set_arb_sample(&mut self, index: u32, sample: u16) -> Result<()> {
        self.backend_mut()?
            .write_arb_sample(index, u32::from(sample))?;
        trace!("Arbitrary sample[{index}] = {sample:#06x}");
        Ok(())
    }

    /// Load `samples` starting at `start_offset`, then set depth to the count
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if `samples` is empty
    /// - `OutOfRange` if more than [`MAX_ARB_SAMPLES`] samples, or if
    ///   `start_offset + len` overflows the 32-bit index space
    /// - `AllocationFailure` if the staging buffer cannot be reserved
    /// - `NotInitialized` without a backend; `IoFailure` on a failed write
    pub fn load_waveform(&mut self, samples: &[u16], start_offset: u32) -> Result<()> {
        self.backend()?;
        if samples.is_empty() {
            return Err(WavegenError::invalid_parameter("empty arbitrary waveform"));
        }
        if samples.len() > MAX_ARB_SAMPLES {
            return Err(WavegenError::out_of_range(
                samples.len() as u64,
                MAX_ARB_SAMPLES as u64,
            ));
        }
        // Bounded by MAX_ARB_SAMPLES above
        let count = u32::try_from(samples.len())
            .map_err(|_| WavegenError::out_of_range(samples.len() as u64, u64::from(u32::MAX)))?;
        if start_offset.checked_add(count).is_none() {
            return Err(WavegenError::out_of_range(
                u64::from(start_offset) + u64::from(count),
                u64::from(u32::MAX),
            ));
        }

        let words = stage(samples)?;
        let backend = self.backend_mut()?;
        backend.write_arb_block(start_offset, &words)?;
        backend.write_register(regs::ARB_DEPTH, count)?;
        debug!("Loaded {count} arbitrary samples at offset {start_offset}");
        Ok(())
    }
}
