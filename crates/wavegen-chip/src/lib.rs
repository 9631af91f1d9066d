// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the dual-channel waveform generator IP core.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the register interface: offsets, bit layouts, mode codes and
//! the packed-field arithmetic used to update one channel of a shared register.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | AXI-Lite register map (15 slots), status/flag bits, address window |
//! | [`field`] | Packed-field codec: channel A low half, channel B high half |
//! | [`mode`] | Waveform mode codes (4-bit per channel) |
//! | [`lane`] | Hardware lane (A or B) addressed by a packed field or flag bit |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod field;
pub mod lane;
pub mod mode;
pub mod regs;

pub use field::PackedField;
pub use lane::Lane;
pub use mode::{InvalidMode, WaveformMode};
pub use regs::Register;
