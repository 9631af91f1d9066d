// SPDX-License-Identifier: AGPL-3.0-only

//! Packed-field codec.
//!
//! A packed register carries the same parameter for both lanes in two
//! adjacent, equal-width bit ranges:
//!
//! ```text
//! bit  31 ......... low+2w  low+2w-1 ... low+w  low+w-1 ... low  low-1 ... 0
//!      [   untouched     ]  [    lane B     ]   [    lane A   ]  [untouched]
//! ```
//!
//! Packing is a pure read-modify-write on a caller-supplied raw image: only
//! the target lane's bits change. Values wider than the field are masked,
//! never rejected; range checks belong to the caller.

use crate::lane::Lane;

/// Bit placement of one per-lane field inside a packed 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedField {
    low: u32,
    width: u32,
}

impl PackedField {
    /// 4-bit mode field: lane A `[3:0]`, lane B `[7:4]`.
    pub const MODE: Self = Self::new(0, 4);

    /// 16-bit half-word field: lane A `[15:0]`, lane B `[31:16]`.
    pub const HALF_WORD: Self = Self::new(0, 16);

    /// Describe a field of `width` bits per lane starting at bit `low`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0 or larger than 16, or if both lanes do not fit
    /// in 32 bits. Evaluated at compile time for the constants above.
    #[must_use]
    pub const fn new(low: u32, width: u32) -> Self {
        assert!(width >= 1 && width <= 16, "packed field width must be 1..=16");
        assert!(low + 2 * width <= 32, "packed field exceeds 32 bits");
        Self { low, width }
    }

    /// Width of one lane's sub-field in bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Unshifted value mask (`width` ones).
    #[must_use]
    pub const fn mask(&self) -> u32 {
        (1 << self.width) - 1
    }

    /// Bit position of the lane's least-significant bit.
    #[must_use]
    pub const fn shift(&self, lane: Lane) -> u32 {
        self.low + (lane as u32) * self.width
    }

    /// The lane's bits within the register.
    #[must_use]
    pub const fn lane_mask(&self, lane: Lane) -> u32 {
        self.mask() << self.shift(lane)
    }

    /// Replace `lane`'s sub-field of `current_raw` with `value`.
    ///
    /// `value` is truncated to the field width. All other bits of
    /// `current_raw`, including the sibling lane, are returned unchanged.
    #[must_use]
    pub const fn pack(&self, current_raw: u32, lane: Lane, value: u32) -> u32 {
        (current_raw & !self.lane_mask(lane)) | ((value & self.mask()) << self.shift(lane))
    }

    /// Signed variant of [`pack`](Self::pack): two's-complement, truncated.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn pack_signed(&self, current_raw: u32, lane: Lane, value: i32) -> u32 {
        self.pack(current_raw, lane, value as u32)
    }

    /// Extract `lane`'s sub-field, zero-extended.
    #[must_use]
    pub const fn unpack(&self, raw: u32, lane: Lane) -> u32 {
        (raw >> self.shift(lane)) & self.mask()
    }

    /// Extract `lane`'s sub-field, sign-extended from the field width.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn unpack_signed(&self, raw: u32, lane: Lane) -> i32 {
        let spare = 32 - self.width;
        ((self.unpack(raw, lane) << spare) as i32) >> spare
    }
}

/// Pack `value` into `lane`'s `width`-bit field of `current_raw`, fields
/// starting at bit 0.
///
/// # Panics
///
/// Panics if `width` is not in `1..=16`.
#[must_use]
pub const fn pack_field(current_raw: u32, lane: Lane, width: u32, value: u32) -> u32 {
    PackedField::new(0, width).pack(current_raw, lane, value)
}

/// Mirror of [`pack_field`], zero-extended.
///
/// # Panics
///
/// Panics if `width` is not in `1..=16`.
#[must_use]
pub const fn unpack_field(raw: u32, lane: Lane, width: u32) -> u32 {
    PackedField::new(0, width).unpack(raw, lane)
}
