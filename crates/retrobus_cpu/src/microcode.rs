//! Control-ROM generation.
//!
//! Every clock cycle the engine looks up the control word for the current
//! (opcode, step, flags) triple. The table is a materialised copy of
//! [`control_word`], built once and never modified afterwards.

use std::fmt;

use lazy_static::lazy_static;

use crate::consts::{CLOCKS_PER_INSTR, FETCH_STEPS, FLAG_COMBINATIONS, OPCODE_COUNT};
use crate::control::ControlWord;
use crate::error::TableError;
use crate::flags::Flags;
use crate::isa::Opcode;

lazy_static! {
    /// Table shared by every machine in the process.
    pub static ref MICROCODE: MicrocodeTable = MicrocodeTable::build();
}

const FETCH: [ControlWord; FETCH_STEPS as usize] = [
    ControlWord::CO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::II).union(ControlWord::CE),
];

const NOP: &[ControlWord] = &[ControlWord::RS];

const HLT: &[ControlWord] = &[ControlWord::RS.union(ControlWord::HT)];

const LDA: &[ControlWord] = &[
    ControlWord::CO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::MI).union(ControlWord::CE),
    ControlWord::MO.union(ControlWord::AI).union(ControlWord::RS),
];

const LDB: &[ControlWord] = &[
    ControlWord::CO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::MI).union(ControlWord::CE),
    ControlWord::MO.union(ControlWord::BI).union(ControlWord::RS),
];

const JUMP: &[ControlWord] = &[
    ControlWord::CO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::CI).union(ControlWord::RS),
];

/// Conditional jump whose condition is false: step over the operand.
const SKIP_OPERAND: &[ControlWord] = &[ControlWord::CE.union(ControlWord::RS)];

const ALU_TO_A: &[ControlWord] = &[ControlWord::AL
    .union(ControlWord::AI)
    .union(ControlWord::RS)];

const OUT: &[ControlWord] = &[ControlWord::OT.union(ControlWord::RS)];

const PSH: &[ControlWord] = &[
    ControlWord::SO.union(ControlWord::MI),
    ControlWord::AO
        .union(ControlWord::MB)
        .union(ControlWord::WE)
        .union(ControlWord::SI)
        .union(ControlWord::RS),
];

const POP: &[ControlWord] = &[
    ControlWord::SD,
    ControlWord::SO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::AI).union(ControlWord::RS),
];

/// Saves the operand address on the stack, then jumps through the operand.
const JSR: &[ControlWord] = &[
    ControlWord::SO.union(ControlWord::MI),
    ControlWord::CO
        .union(ControlWord::MB)
        .union(ControlWord::WE)
        .union(ControlWord::SI),
    ControlWord::CO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::CI).union(ControlWord::RS),
];

/// Restores the saved operand address and steps past it.
const RET: &[ControlWord] = &[
    ControlWord::SD,
    ControlWord::SO.union(ControlWord::MI),
    ControlWord::MO.union(ControlWord::CI),
    ControlWord::CE.union(ControlWord::RS),
];

const MAB: &[ControlWord] = &[ControlWord::AO
    .union(ControlWord::BI)
    .union(ControlWord::RS)];

const MBA: &[ControlWord] = &[ControlWord::BO
    .union(ControlWord::AI)
    .union(ControlWord::RS)];

/// Index into the control ROM.
///
/// `flags` is the flag register as it stood when the cycle started. Bits
/// above the 5-bit flag field are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MicrocodeKey {
    pub opcode: u8,
    pub step: u8,
    pub flags: Flags,
}

impl MicrocodeKey {
    pub fn new(opcode: u8, step: u8, flags: Flags) -> Self {
        Self {
            opcode,
            step,
            flags: Flags::from_bits_retain(flags.bits() & (FLAG_COMBINATIONS as u8 - 1)),
        }
    }

    /// Every key the table must define.
    pub fn all() -> impl Iterator<Item = MicrocodeKey> {
        (0..OPCODE_COUNT).flat_map(|opcode| {
            (0..CLOCKS_PER_INSTR).flat_map(move |step| {
                (0..FLAG_COMBINATIONS).map(move |mask| {
                    MicrocodeKey::new(opcode as u8, step, Flags::from_bits_retain(mask as u8))
                })
            })
        })
    }

    #[inline]
    pub fn index(&self) -> usize {
        debug_assert!(self.step < CLOCKS_PER_INSTR);
        let mask = (self.flags.bits() as usize) & (FLAG_COMBINATIONS - 1);
        (self.opcode as usize * CLOCKS_PER_INSTR as usize + self.step as usize) * FLAG_COMBINATIONS
            + mask
    }
}

impl fmt::Display for MicrocodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Opcode::from_byte(self.opcode) {
            Some(op) => write!(f, "{op}")?,
            None => write!(f, "0x{:02X}", self.opcode)?,
        }
        write!(f, " | {} | {}", self.step, self.flags)
    }
}

/// Control word for one cycle, computed directly from the key.
pub fn control_word(key: MicrocodeKey) -> ControlWord {
    if key.step < FETCH_STEPS {
        return FETCH[key.step as usize];
    }
    let Some(op) = Opcode::from_byte(key.opcode) else {
        return ControlWord::empty();
    };
    execute_steps(op, key.flags)
        .get((key.step - FETCH_STEPS) as usize)
        .copied()
        .unwrap_or_default()
}

/// Execute-phase microprogram, starting at step 2.
fn execute_steps(op: Opcode, flags: Flags) -> &'static [ControlWord] {
    let jump_if = |flag: Flags| {
        if flags.contains(flag) {
            JUMP
        } else {
            SKIP_OPERAND
        }
    };
    match op {
        Opcode::Nop => NOP,
        Opcode::Hlt => HLT,
        Opcode::Lda => LDA,
        Opcode::Ldb => LDB,
        Opcode::Jmp => JUMP,
        Opcode::Jpz => jump_if(Flags::ZERO),
        Opcode::Jpn => jump_if(Flags::NEGATIVE),
        Opcode::Jpc => jump_if(Flags::CARRY),
        Opcode::Add | Opcode::Sub | Opcode::Xor | Opcode::And => ALU_TO_A,
        Opcode::Out => OUT,
        Opcode::Psh => PSH,
        Opcode::Pop => POP,
        Opcode::Jsr => JSR,
        Opcode::Ret => RET,
        Opcode::Mab => MAB,
        Opcode::Mba => MBA,
    }
}

/// Control ROM covering every (opcode, step, flags) combination.
#[derive(Clone)]
pub struct MicrocodeTable {
    words: Vec<ControlWord>,
}

impl MicrocodeTable {
    /// Populate the table from [`control_word`].
    pub fn build() -> Self {
        let table = Self::from_fn(control_word);
        log::debug!("microcode table built: {} entries", table.len());
        table
    }

    /// Populate the table from an arbitrary generator.
    pub fn from_fn(mut generate: impl FnMut(MicrocodeKey) -> ControlWord) -> Self {
        let mut words = vec![ControlWord::empty(); Self::capacity()];
        for key in MicrocodeKey::all() {
            words[key.index()] = generate(key);
        }
        Self { words }
    }

    #[inline]
    pub const fn capacity() -> usize {
        OPCODE_COUNT * CLOCKS_PER_INSTR as usize * FLAG_COMBINATIONS
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn get(&self, key: MicrocodeKey) -> ControlWord {
        self.words[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MicrocodeKey, ControlWord)> + '_ {
        MicrocodeKey::all().map(move |key| (key, self.get(key)))
    }

    /// Check the table against the bus model.
    ///
    /// No cycle may have two bus drivers or move the stack pointer both
    /// ways, and every defined instruction must reset the step counter
    /// before running out of steps, whatever the flags, without an empty
    /// step on the way. The engine treats an empty execute step as an
    /// undefined opcode.
    pub fn validate(&self) -> Result<(), TableError> {
        for (key, word) in self.iter() {
            if word.has_bus_contention() {
                return Err(TableError::BusContention {
                    key,
                    drivers: word.bus_drivers(),
                });
            }
            if word.contains(ControlWord::SI | ControlWord::SD) {
                return Err(TableError::StackConflict { key });
            }
        }

        for op in Opcode::ALL {
            for mask in 0..FLAG_COMBINATIONS as u8 {
                self.validate_sequence(op, Flags::from_bits_retain(mask))?;
            }
        }
        Ok(())
    }

    /// Execute steps of `op` must all assert something up to and including
    /// the one that resets the step counter.
    fn validate_sequence(&self, op: Opcode, flags: Flags) -> Result<(), TableError> {
        for step in FETCH_STEPS..CLOCKS_PER_INSTR {
            let key = MicrocodeKey::new(op.byte(), step, flags);
            let word = self.get(key);
            if word.is_empty() {
                return Err(TableError::EmptyStep { key });
            }
            if word.contains(ControlWord::RS) {
                return Ok(());
            }
        }
        Err(TableError::MissingReset {
            opcode: op.byte(),
            flags: flags.bits(),
        })
    }
}

impl fmt::Debug for MicrocodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrocodeTable")
            .field("entries", &self.words.len())
            .finish()
    }
}
