use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Control signals asserted during one clock cycle.
    ///
    /// Names follow the usual breadboard-computer shorthand: `xO` drives
    /// register x onto the bus, `xI` latches the bus into register x.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ControlWord: u32 {
        /// Program counter in.
        const CI = 1 << 0;
        /// Program counter out.
        const CO = 1 << 1;
        /// Program counter increment.
        const CE = 1 << 2;
        const AI = 1 << 3;
        const AO = 1 << 4;
        const BI = 1 << 5;
        const BO = 1 << 6;
        /// Memory address register in.
        const MI = 1 << 7;
        /// Memory buffer register out.
        const MO = 1 << 8;
        /// Instruction register in.
        const II = 1 << 9;
        const HT = 1 << 10;
        /// Reset the step counter (and clear the instruction register).
        const RS = 1 << 11;
        /// ALU latch out.
        const AL = 1 << 12;
        /// Emit register A on the output channel.
        const OT = 1 << 13;
        /// Current stack slot address out.
        const SO = 1 << 14;
        /// Stack pointer increment.
        const SI = 1 << 15;
        /// Stack pointer decrement.
        const SD = 1 << 16;
        /// Memory write enable.
        const WE = 1 << 17;
        /// Memory buffer register in.
        const MB = 1 << 18;
    }
}

impl ControlWord {
    /// Signals that place a value on the shared bus.
    pub const BUS_DRIVERS: ControlWord = ControlWord::CO
        .union(ControlWord::AO)
        .union(ControlWord::BO)
        .union(ControlWord::MO)
        .union(ControlWord::AL)
        .union(ControlWord::SO);

    #[inline]
    pub fn bus_drivers(self) -> ControlWord {
        self & Self::BUS_DRIVERS
    }

    /// More than one source would drive the bus in the same cycle.
    #[inline]
    pub fn has_bus_contention(self) -> bool {
        self.bus_drivers().bits().count_ones() > 1
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nineteen_independent_signals() {
        assert_eq!(ControlWord::all().bits().count_ones(), 19);
    }

    #[test]
    fn display_lists_signals_in_declaration_order() {
        let word = ControlWord::RS | ControlWord::MO | ControlWord::II | ControlWord::CE;
        assert_eq!(word.to_string(), "CE MO II RS");
        assert_eq!(ControlWord::empty().to_string(), "-");
    }

    #[test]
    fn contention_counts_only_drivers() {
        assert!(!(ControlWord::AO | ControlWord::BI | ControlWord::MB).has_bus_contention());
        assert!((ControlWord::AO | ControlWord::BO).has_bus_contention());
    }
}
