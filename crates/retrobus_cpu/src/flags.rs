use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Condition bits written by the ALU and read by conditional jumps.
    ///
    /// Only the low 5 bits are meaningful; bit 4 is reserved.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const ZERO = 0x08;
        const NEGATIVE = 0x04;
        const CARRY = 0x02;
        const PARITY = 0x01;
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let z = if self.contains(Flags::ZERO) { 'Z' } else { '-' };
        let n = if self.contains(Flags::NEGATIVE) { 'N' } else { '-' };
        let c = if self.contains(Flags::CARRY) { 'C' } else { '-' };
        let p = if self.contains(Flags::PARITY) { 'P' } else { '-' };
        write!(f, "{z}{n}{c}{p}")
    }
}
