//! Biased midpoint selection
//!
//! The first probe of a biased binary search is not `(low + high) / 2`. The
//! size of the range keeps only its few highest bits; all lower bits are turned
//! into ones and then masked with the bias constant. This gives a probe a bit
//! below the range's midpoint whose low-order bits come from the constant,
//! which keeps probes off power-of-two strides.
//!
//! Everything here is 32-bit wrapping arithmetic with arithmetic right shifts.
//! That is the integer model of the search being tuned, and the constant is
//! meaningless if these bit patterns drift from it.

use crate::constant::BiasConstant;

/// First probe of a biased search over `[from_index, to_index)`
#[inline]
pub fn biased_midpoint(constant: BiasConstant, from_index: i32, to_index: i32) -> i32 {
    let size = to_index.wrapping_sub(from_index);
    let nlz = size.leading_zeros();
    // keep a couple of extra size bits for the largest arrays
    let keep_bits = nlz + (36 - nlz) / 16;
    let high = i32::MIN.wrapping_shr(keep_bits);

    // zero the low bits, then turn them all into ones
    let mid = (size & high).wrapping_sub(1);

    let mask = (constant.get() as i32) | high;
    (mid & mask).wrapping_add(from_index)
}

/// Plain midpoint of the inclusive range `[low, high]`
#[inline]
pub fn standard_midpoint(low: i64, high: i64) -> i64 {
    (low + high) >> 1
}
