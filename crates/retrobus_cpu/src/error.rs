use thiserror::Error;

use crate::control::ControlWord;
use crate::microcode::MicrocodeKey;

/// Failures while simulating or preparing a simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("program image is {actual} bytes, expected exactly {expected}")]
    ImageSize { expected: usize, actual: usize },

    #[error("stack size {size} is outside 1..={max}")]
    StackSize { size: u8, max: u8 },

    #[error("invalid opcode 0x{opcode:02X} at address 0x{address:02X}")]
    InvalidOpcode { opcode: u8, address: u8 },

    #[error("step counter {step} is outside 0..{max}")]
    StepOutOfRange { step: u8, max: u8 },

    #[error("machine is halted")]
    Halted,

    #[error("no halt after {cycles} cycles")]
    CycleLimit { cycles: u64 },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A microcode table that breaks the bus model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("{key}: several bus drivers asserted ({drivers})")]
    BusContention {
        key: MicrocodeKey,
        drivers: ControlWord,
    },

    #[error("{key}: stack pointer incremented and decremented together")]
    StackConflict { key: MicrocodeKey },

    #[error("{key}: empty step before the step counter resets")]
    EmptyStep { key: MicrocodeKey },

    #[error("opcode 0x{opcode:02X} with flags 0x{flags:02X} never resets the step counter")]
    MissingReset { opcode: u8, flags: u8 },
}

/// Problems found while assembling source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: cannot parse `{token}`")]
    UnknownToken { line: usize, token: String },

    #[error("line {line}: `{name}` is a reserved word")]
    ReservedWord { line: usize, name: String },

    #[error("line {line}: cannot recognise label `{text}`")]
    MalformedLabel { line: usize, text: String },

    #[error("line {line}: label `{name}` is already defined")]
    DuplicateLabel { line: usize, name: String },

    #[error("line {line}: `{token}` does not fit in a byte")]
    OutOfRange { line: usize, token: String },

    #[error("line {line}: reference to undefined label `{name}`")]
    UnresolvedReference { line: usize, name: String },

    #[error("program is {size} bytes, only {capacity} fit")]
    TooLarge { size: usize, capacity: usize },
}
