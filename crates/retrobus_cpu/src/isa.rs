use std::fmt;

/// Instructions understood by the machine.
///
/// Every instruction is one opcode byte, optionally followed by one operand
/// byte holding an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x01,
    /// A <- mem[operand]
    Lda = 0x02,
    /// B <- mem[operand]
    Ldb = 0x03,
    Jmp = 0x04,
    Add = 0x05,
    Sub = 0x06,
    Xor = 0x07,
    Out = 0x08,
    Jpz = 0x09,
    Hlt = 0x0a,
    Jpn = 0x0b,
    Jpc = 0x0c,
    And = 0x0d,
    Psh = 0x0e,
    Pop = 0x0f,
    /// Jump to subroutine, saving the operand address on the stack.
    Jsr = 0x10,
    Ret = 0x11,
    /// B <- A
    Mab = 0x12,
    /// A <- B
    Mba = 0x13,
}

impl Opcode {
    pub const ALL: [Opcode; 19] = [
        Opcode::Nop,
        Opcode::Lda,
        Opcode::Ldb,
        Opcode::Jmp,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Xor,
        Opcode::Out,
        Opcode::Jpz,
        Opcode::Hlt,
        Opcode::Jpn,
        Opcode::Jpc,
        Opcode::And,
        Opcode::Psh,
        Opcode::Pop,
        Opcode::Jsr,
        Opcode::Ret,
        Opcode::Mab,
        Opcode::Mba,
    ];

    /// Decode an opcode byte. Returns `None` for bytes with no instruction.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.iter().copied().find(|op| *op as u8 == byte)
    }

    /// Look up an instruction by mnemonic, ignoring case.
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Lda => "LDA",
            Opcode::Ldb => "LDB",
            Opcode::Jmp => "JMP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Xor => "XOR",
            Opcode::Out => "OUT",
            Opcode::Jpz => "JPZ",
            Opcode::Hlt => "HLT",
            Opcode::Jpn => "JPN",
            Opcode::Jpc => "JPC",
            Opcode::And => "AND",
            Opcode::Psh => "PSH",
            Opcode::Pop => "POP",
            Opcode::Jsr => "JSR",
            Opcode::Ret => "RET",
            Opcode::Mab => "MAB",
            Opcode::Mba => "MBA",
        }
    }

    /// Whether the opcode is followed by an address byte.
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            Opcode::Lda
                | Opcode::Ldb
                | Opcode::Jmp
                | Opcode::Jpz
                | Opcode::Jpn
                | Opcode::Jpc
                | Opcode::Jsr
        )
    }

    /// Whether the ALU produces a result and flags for this opcode.
    pub fn is_alu(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Xor | Opcode::And)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
