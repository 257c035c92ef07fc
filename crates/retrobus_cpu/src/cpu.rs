use std::fmt;

use crate::flags::Flags;

/// Register file of the machine.
///
/// Every field is a plain 8-bit latch. The engine is the only writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub b: u8,
    /// Program counter.
    pub pc: u8,
    /// Memory address register.
    pub mar: u8,
    /// Memory buffer register.
    pub mbr: u8,
    /// Instruction register.
    pub ir: u8,
    /// Sub-program counter, 0..CLOCKS_PER_INSTR.
    pub step: u8,
    pub flags: Flags,
    /// ALU output latch.
    pub alu: u8,
    /// Stack pointer, 0..stack size.
    pub sp: u8,
    /// Value driven onto the bus during the last cycle.
    pub bus: u8,
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A={:02X} B={:02X} PC={:02X} MAR={:02X} MBR={:02X} IR={:02X} SP={:02X} F={}",
            self.a, self.b, self.pc, self.mar, self.mbr, self.ir, self.sp, self.flags
        )
    }
}
