// SPDX-License-Identifier: AGPL-3.0-only

//! Sample generators
//!
//! [`sine_samples`] produces an arbitrary-waveform block for
//! [`Wavegen::load_waveform`](crate::Wavegen::load_waveform).
//! [`quarter_sine_lut`] and [`to_coe`] build the ROM image the DDS core is
//! synthesised with, in Xilinx COE format.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;

use crate::error::{Result, WavegenError};

/// Midscale of an offset-binary 16-bit sample
pub const MIDSCALE: u16 = 0x8000;

/// Default quarter-wave ROM width
pub const DEFAULT_LUT_WIDTH: u32 = 16;

/// Default quarter-wave ROM depth
pub const DEFAULT_LUT_DIVISIONS: usize = 512;

/// One full sine period of `count` offset-binary samples
///
/// `amplitude` is clamped to 32767. Empty when `count` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn sine_samples(count: usize, amplitude: u16) -> Vec<u16> {
    let amplitude = f64::from(amplitude.min(i16::MAX as u16));
    (0..count)
        .map(|i| {
            let phase = TAU * i as f64 / count as f64;
            let value = (amplitude * phase.sin()).round() as i32;
            (i32::from(MIDSCALE) + value) as u16
        })
        .collect()
}

/// Quarter-wave sine table of `divisions` entries, `width_bits` wide
///
/// Entry `i` is `round(sin(i·(π/2)/divisions) · (2^(w-1) - 1))` masked to
/// `w` bits. The table stops one step short of π/2.
///
/// # Errors
///
/// `InvalidParameter` if `width_bits` is not in `2..=32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn quarter_sine_lut(width_bits: u32, divisions: usize) -> Result<Vec<u32>> {
    if !(2..=32).contains(&width_bits) {
        return Err(WavegenError::invalid_parameter(format!(
            "LUT width {width_bits} outside 2..=32"
        )));
    }
    let full_scale = f64::from((1u32 << (width_bits - 1)) - 1);
    let mask = u32::MAX >> (32 - width_bits);
    let delta = FRAC_PI_2 / divisions as f64;
    Ok((0..divisions)
        .map(|i| ((i as f64 * delta).sin() * full_scale).round() as u32 & mask)
        .collect())
}

/// Render a table as Xilinx COE text (radix 16)
#[must_use]
pub fn to_coe(lut: &[u32], width_bits: u32) -> String {
    let digits = width_bits.div_ceil(4) as usize;
    let mut out = String::from("memory_initialization_radix=16;\nmemory_initialization_vector=\n");
    for (i, value) in lut.iter().enumerate() {
        let delim = if i + 1 == lut.len() { "" } else { "," };
        // Writing to a String cannot fail
        let _ = writeln!(out, "{value:0digits$X}{delim}");
    }
    out.push_str(";\n");
    out
}
