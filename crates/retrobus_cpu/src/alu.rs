use crate::flags::Flags;
use crate::isa::Opcode;

/// Value latched by the ALU together with the freshly computed flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: Flags,
}

/// Combinational ALU output for the opcode in the instruction register.
///
/// Returns `None` when the opcode is not an ALU operation, in which case
/// neither the latch nor the flags change. Flags are rebuilt from scratch.
pub fn evaluate(opcode: u8, a: u8, b: u8) -> Option<AluResult> {
    let op = Opcode::from_byte(opcode).filter(|op| op.is_alu())?;
    let mut flags = Flags::empty();
    let value = match op {
        Opcode::Add => {
            let (value, carry) = a.overflowing_add(b);
            flags.set(Flags::CARRY, carry);
            value
        }
        Opcode::Sub => {
            flags.set(Flags::NEGATIVE, a < b);
            a.wrapping_sub(b)
        }
        Opcode::Xor => a ^ b,
        Opcode::And => a & b,
        _ => unreachable!("{op} is not an ALU opcode"),
    };
    flags.set(Flags::ZERO, value == 0);
    flags.set(Flags::PARITY, value.count_ones() % 2 == 0);
    Some(AluResult { value, flags })
}
