//! The 28-bit bias constant

use std::fmt;

/// Number of significant bits in a bias constant
pub const BIAS_BITS: u32 = 28;

/// Mask selecting the significant bits of a bias constant
pub const BIAS_MASK: u32 = (1 << BIAS_BITS) - 1;

/// Number of distinct bias constants
pub const BIAS_DOMAIN: usize = 1 << BIAS_BITS;

/// A candidate value folded into the biased midpoint formula.
///
/// Only the low 28 bits are kept; construction silently masks the rest so
/// every constant is a valid index into a dense table of `BIAS_DOMAIN` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BiasConstant(u32);

impl BiasConstant {
    /// Create a constant, keeping the low 28 bits of `value`
    pub const fn new(value: u32) -> Self {
        Self(value & BIAS_MASK)
    }

    /// Raw integer value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Render the full 32-bit pattern grouped by byte, e.g.
    /// `00000100 10111111 00110011 11111011`
    pub fn bit_groups(self) -> String {
        let bits = format!("{:032b}", self.0);
        let mut out = String::with_capacity(35);
        for (i, chunk) in bits.as_bytes().chunks(8).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        }
        out
    }
}

impl From<u32> for BiasConstant {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for BiasConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
