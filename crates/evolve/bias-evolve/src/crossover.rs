//! Crossover operators
//!
//! Each operator combines two parents through fixed bit masks: whole halves,
//! alternating nibbles or bytes, single nibble swaps, a union, a shifted
//! splice, or simply the first parent. All are pure and deterministic.

use std::fmt;

/// Bit-mask recombination of two parent values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crossover {
    /// High half of `a`, low half of `b`
    C1,
    /// Alternating nibbles
    C2,
    /// Alternating bytes
    C3,
    /// Middle byte of `b`
    C4,
    /// Nibble 1 of `b`
    C5,
    /// Nibble 2 of `b`
    C6,
    /// Nibble 3 of `b`
    C7,
    /// Nibble 4 of `b`
    C8,
    /// Nibble 5 of `b`
    C9,
    /// Nibble 6 of `b`
    C10,
    /// Union of both parents
    C11,
    /// Bits 16..28 of `a` moved down, bits 4..16 of `b` moved up
    C12,
    /// `a` unchanged
    C13,
}

impl Crossover {
    pub const ALL: [Crossover; 13] = [
        Crossover::C1,
        Crossover::C2,
        Crossover::C3,
        Crossover::C4,
        Crossover::C5,
        Crossover::C6,
        Crossover::C7,
        Crossover::C8,
        Crossover::C9,
        Crossover::C10,
        Crossover::C11,
        Crossover::C12,
        Crossover::C13,
    ];

    #[inline]
    pub fn cross(self, a: u32, b: u32) -> u32 {
        // (bits kept from a, bits taken from b)
        let split = |keep: u32, take: u32| (a & keep) | (b & take);
        match self {
            Crossover::C1 => split(0xFFFF_0000, 0x0000_FFFF),
            Crossover::C2 => split(0xF0F0_F0F0, 0x0F0F_0F0F),
            Crossover::C3 => split(0xFF00_FF00, 0x00FF_00FF),
            Crossover::C4 => split(0xFFF0_0FFF, 0x000F_F000),
            Crossover::C5 => split(0xFFFF_FF0F, 0x0000_00F0),
            Crossover::C6 => split(0xFFFF_F0FF, 0x0000_0F00),
            Crossover::C7 => split(0xFFFF_0FFF, 0x0000_F000),
            Crossover::C8 => split(0xFFF0_FFFF, 0x000F_0000),
            Crossover::C9 => split(0xFF0F_FFFF, 0x00F0_0000),
            Crossover::C10 => split(0xF0FF_FFFF, 0x0F00_0000),
            Crossover::C11 => a | b,
            Crossover::C12 => ((a & 0x0FFF_0000) >> 12) | ((b & 0x0000_FFF0) << 12),
            Crossover::C13 => a,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Crossover::C1 => "C1",
            Crossover::C2 => "C2",
            Crossover::C3 => "C3",
            Crossover::C4 => "C4",
            Crossover::C5 => "C5",
            Crossover::C6 => "C6",
            Crossover::C7 => "C7",
            Crossover::C8 => "C8",
            Crossover::C9 => "C9",
            Crossover::C10 => "C10",
            Crossover::C11 => "C11",
            Crossover::C12 => "C12",
            Crossover::C13 => "C13",
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
