//! Fixed hardware parameters of the machine.

/// Clock cycles every instruction is given, fetch included.
pub const CLOCKS_PER_INSTR: u8 = 6;

/// Steps 0 and 1 fetch the opcode and are shared by every instruction.
pub const FETCH_STEPS: u8 = 2;

/// Size of the 8-bit address space in bytes.
pub const ADDRESS_SPACE: usize = 256;

/// Width of the flag field in a microcode key.
pub const FLAG_BITS: u32 = 5;

/// Number of distinct flag masks a microcode key can carry.
pub const FLAG_COMBINATIONS: usize = 1 << FLAG_BITS;

/// Number of possible opcode bytes.
pub const OPCODE_COUNT: usize = 256;

/// Reserved stack slots at the top of memory unless configured otherwise.
pub const DEFAULT_STACK_SIZE: u8 = 16;

/// Largest stack that still leaves the low half of memory for programs.
pub const MAX_STACK_SIZE: u8 = 128;
