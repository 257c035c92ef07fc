//! Microcoded 8-bit bus computer.
//!
//! [`microcode`] builds the control ROM, [`engine`] runs one clock cycle
//! against it, and [`Machine`] owns the state for a whole run.

pub mod alu;
pub mod asm;
pub mod consts;
pub mod control;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod flags;
pub mod isa;
pub mod machine;
pub mod memory;
pub mod microcode;

pub use asm::{assemble, Assembly};
pub use control::ControlWord;
pub use cpu::CpuState;
pub use engine::{tick, TickOutcome};
pub use error::{AsmError, SimError, TableError};
pub use flags::Flags;
pub use isa::Opcode;
pub use machine::{Machine, MachineConfig, RunReport};
pub use memory::{Memory, StackGeometry};
pub use microcode::{control_word, MicrocodeKey, MicrocodeTable, MICROCODE};
