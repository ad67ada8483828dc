//! Mutation operators
//!
//! Every operator maps a 28-bit value to another 28-bit value. Single bit
//! operators pick their position uniformly from `0..28`.

use std::fmt;

use bias_core::{BIAS_BITS, BIAS_MASK};
use rand::Rng;

/// Single-value perturbation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Flip one random bit
    FlipBit,
    /// Flip a random bit and its neighbour (wrapping at bit 27)
    FlipAdjacentBits,
    /// Clear one random bit
    ClearBit,
    /// Set one random bit
    SetBit,
    /// Complement all 28 bits
    Invert,
    /// Shift left by one, dropping bit 27
    ShiftLeft,
    /// Shift right by one
    ShiftRight,
    /// Leave the value alone
    Identity,
}

impl Mutation {
    pub const ALL: [Mutation; 8] = [
        Mutation::FlipBit,
        Mutation::FlipAdjacentBits,
        Mutation::ClearBit,
        Mutation::SetBit,
        Mutation::Invert,
        Mutation::ShiftLeft,
        Mutation::ShiftRight,
        Mutation::Identity,
    ];

    pub fn apply<R: Rng + ?Sized>(self, value: u32, rng: &mut R) -> u32 {
        let value = value & BIAS_MASK;
        match self {
            Mutation::FlipBit => value ^ (1u32 << rng.gen_range(0..BIAS_BITS)),
            Mutation::FlipAdjacentBits => {
                let n = rng.gen_range(0..BIAS_BITS);
                value ^ (1u32 << n) ^ (1u32 << ((n + 1) % BIAS_BITS))
            }
            Mutation::ClearBit => value & !(1u32 << rng.gen_range(0..BIAS_BITS)),
            Mutation::SetBit => value | (1u32 << rng.gen_range(0..BIAS_BITS)),
            Mutation::Invert => !value & BIAS_MASK,
            Mutation::ShiftLeft => (value << 1) & BIAS_MASK,
            Mutation::ShiftRight => value >> 1,
            Mutation::Identity => value,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mutation::FlipBit => "flip-bit",
            Mutation::FlipAdjacentBits => "flip-adjacent-bits",
            Mutation::ClearBit => "clear-bit",
            Mutation::SetBit => "set-bit",
            Mutation::Invert => "invert",
            Mutation::ShiftLeft => "shift-left",
            Mutation::ShiftRight => "shift-right",
            Mutation::Identity => "identity",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
