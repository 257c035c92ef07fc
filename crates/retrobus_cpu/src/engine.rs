//! One clock cycle of the bus machine.
//!
//! A cycle treats the control word as a set of independent effects and
//! applies them in a fixed order:
//!
//! 1. look up the control word for (IR, step, flags)
//! 2. advance the step counter
//! 3. bus out: the single asserted driver places its value on the bus
//! 4. bus in: every asserted load latches the bus
//! 5. utilities: PC/SP counting, step reset, output, halt
//! 6. memory: write MBR to [MAR] when WE is asserted, otherwise read [MAR] into MBR
//! 7. ALU: recompute latch and flags if IR holds an ALU opcode

use crate::alu;
use crate::consts::{CLOCKS_PER_INSTR, FETCH_STEPS};
use crate::control::ControlWord;
use crate::cpu::CpuState;
use crate::error::SimError;
use crate::memory::{Memory, StackGeometry};
use crate::microcode::{MicrocodeKey, MicrocodeTable};

/// Observable side effects of one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Byte emitted by an `OUT` instruction in this cycle.
    pub output: Option<u8>,
    /// The halt signal was asserted; no further cycles may run.
    pub halted: bool,
}

/// Run a single clock cycle.
///
/// An empty control word past the fetch steps means the instruction
/// register holds an undefined opcode. That cycle is rejected with
/// [`SimError::InvalidOpcode`] and leaves the state untouched, as is a
/// step counter that has left `0..CLOCKS_PER_INSTR`.
pub fn tick(
    cpu: &mut CpuState,
    memory: &mut Memory,
    table: &MicrocodeTable,
    stack: StackGeometry,
) -> Result<TickOutcome, SimError> {
    if cpu.step >= CLOCKS_PER_INSTR {
        return Err(SimError::StepOutOfRange {
            step: cpu.step,
            max: CLOCKS_PER_INSTR,
        });
    }

    let key = MicrocodeKey::new(cpu.ir, cpu.step, cpu.flags);
    let control = table.get(key);

    if control.is_empty() && cpu.step >= FETCH_STEPS {
        let address = cpu.pc.wrapping_sub(1);
        log::warn!("invalid opcode 0x{:02X} fetched from 0x{:02X}", cpu.ir, address);
        return Err(SimError::InvalidOpcode {
            opcode: cpu.ir,
            address,
        });
    }

    log::trace!("{key} | {control} | {cpu}");

    cpu.step = (cpu.step + 1) % CLOCKS_PER_INSTR;

    // Bus out
    debug_assert!(!control.has_bus_contention(), "{key}: {control}");
    if control.contains(ControlWord::CO) {
        cpu.bus = cpu.pc;
    }
    if control.contains(ControlWord::MO) {
        cpu.bus = cpu.mbr;
    }
    if control.contains(ControlWord::AO) {
        cpu.bus = cpu.a;
    }
    if control.contains(ControlWord::BO) {
        cpu.bus = cpu.b;
    }
    if control.contains(ControlWord::AL) {
        cpu.bus = cpu.alu;
    }
    if control.contains(ControlWord::SO) {
        cpu.bus = stack.slot_address(cpu.sp);
    }

    // Bus in
    let bus = cpu.bus;
    if control.contains(ControlWord::CI) {
        cpu.pc = bus;
    }
    if control.contains(ControlWord::AI) {
        cpu.a = bus;
    }
    if control.contains(ControlWord::BI) {
        cpu.b = bus;
    }
    if control.contains(ControlWord::MI) {
        cpu.mar = bus;
    }
    if control.contains(ControlWord::II) {
        cpu.ir = bus;
    }
    if control.contains(ControlWord::MB) {
        cpu.mbr = bus;
    }

    // Utilities
    if control.contains(ControlWord::CE) {
        cpu.pc = cpu.pc.wrapping_add(1);
    }
    if control.contains(ControlWord::SI) {
        cpu.sp = stack.increment(cpu.sp);
    }
    if control.contains(ControlWord::SD) {
        cpu.sp = stack.decrement(cpu.sp);
    }
    if control.contains(ControlWord::RS) {
        cpu.step = 0;
        cpu.ir = 0;
    }
    let output = control.contains(ControlWord::OT).then_some(cpu.a);
    let halted = control.contains(ControlWord::HT);

    // Memory
    if control.contains(ControlWord::WE) {
        memory.write(cpu.mar, cpu.mbr);
    } else {
        cpu.mbr = memory.read(cpu.mar);
    }

    // ALU
    if let Some(result) = alu::evaluate(cpu.ir, cpu.a, cpu.b) {
        cpu.alu = result.value;
        cpu.flags = result.flags;
    }

    Ok(TickOutcome { output, halted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::isa::Opcode;
    use crate::microcode::MICROCODE;

    const STACK: u8 = 16;

    struct Rig {
        cpu: CpuState,
        memory: Memory,
        stack: StackGeometry,
    }

    impl Rig {
        fn new(program: &[u8]) -> Self {
            let stack = StackGeometry::new(STACK).unwrap();
            let mut image = vec![0; stack.program_size()];
            image[..program.len()].copy_from_slice(program);
            Self {
                cpu: CpuState::new(),
                memory: Memory::load(&image, stack).unwrap(),
                stack,
            }
        }

        fn tick(&mut self) -> TickOutcome {
            tick(&mut self.cpu, &mut self.memory, &MICROCODE, self.stack).unwrap()
        }

        /// Tick until the step counter returns to zero, returning the cycle count.
        fn instruction(&mut self) -> (u32, Vec<TickOutcome>) {
            let mut outcomes = vec![self.tick()];
            while self.cpu.step != 0 {
                outcomes.push(self.tick());
                assert!(outcomes.len() <= CLOCKS_PER_INSTR as usize);
            }
            (outcomes.len() as u32, outcomes)
        }
    }

    #[test]
    fn fetch_loads_ir_and_advances_pc() {
        let mut rig = Rig::new(&[Opcode::Nop.byte()]);
        rig.tick();
        assert_eq!(rig.cpu.mar, 0);
        assert_eq!(rig.cpu.step, 1);
        rig.tick();
        assert_eq!(rig.cpu.ir, Opcode::Nop.byte());
        assert_eq!(rig.cpu.pc, 1);
        assert_eq!(rig.cpu.step, 2);
    }

    #[test]
    fn instruction_cycle_counts() {
        let mut rig = Rig::new(&[
            Opcode::Nop.byte(),
            Opcode::Lda.byte(),
            0x20,
            Opcode::Jsr.byte(),
            0x06,
            Opcode::Hlt.byte(),
            Opcode::Ret.byte(),
        ]);
        assert_eq!(rig.instruction().0, 3);
        assert_eq!(rig.instruction().0, 5);
        assert_eq!(rig.instruction().0, 6);
        assert_eq!(rig.instruction().0, 6);
        assert_eq!(rig.cpu.pc, 5);
    }

    #[test]
    fn add_latches_result_and_sets_carry() {
        let mut rig = Rig::new(&[Opcode::Add.byte()]);
        rig.cpu.a = 250;
        rig.cpu.b = 10;
        rig.instruction();
        assert_eq!(rig.cpu.a, 4);
        assert!(rig.cpu.flags.contains(Flags::CARRY));
        assert!(!rig.cpu.flags.contains(Flags::ZERO));
    }

    #[test]
    fn sub_latches_result_and_sets_negative() {
        let mut rig = Rig::new(&[Opcode::Sub.byte()]);
        rig.cpu.a = 3;
        rig.cpu.b = 5;
        rig.instruction();
        assert_eq!(rig.cpu.a, 254);
        assert!(rig.cpu.flags.contains(Flags::NEGATIVE));
    }

    #[test]
    fn non_alu_instructions_keep_flags() {
        let mut rig = Rig::new(&[Opcode::Sub.byte(), Opcode::Nop.byte(), Opcode::Mab.byte()]);
        rig.cpu.a = 9;
        rig.cpu.b = 9;
        rig.instruction();
        assert_eq!(rig.cpu.flags, Flags::ZERO | Flags::PARITY);
        rig.instruction();
        rig.instruction();
        assert_eq!(rig.cpu.flags, Flags::ZERO | Flags::PARITY);
        assert_eq!(rig.cpu.b, 0);
    }

    #[test]
    fn load_is_indirect_through_operand() {
        let mut rig = Rig::new(&[Opcode::Ldb.byte(), 0x30]);
        rig.memory.write(0x30, 0x99);
        rig.instruction();
        assert_eq!(rig.cpu.b, 0x99);
        assert_eq!(rig.cpu.pc, 2);
    }

    #[test]
    fn untaken_conditional_jump_skips_operand() {
        for op in [Opcode::Jpz, Opcode::Jpn, Opcode::Jpc] {
            let mut rig = Rig::new(&[op.byte(), 0x40]);
            rig.cpu.flags = Flags::PARITY;
            let (cycles, _) = rig.instruction();
            assert_eq!(cycles, 3, "{op}");
            assert_eq!(rig.cpu.pc, 2, "{op}");
        }
    }

    #[test]
    fn taken_conditional_jump_loads_operand() {
        let mut rig = Rig::new(&[Opcode::Jpc.byte(), 0x40]);
        rig.cpu.flags = Flags::CARRY;
        let (cycles, _) = rig.instruction();
        assert_eq!(cycles, 4);
        assert_eq!(rig.cpu.pc, 0x40);
    }

    #[test]
    fn push_then_pop_restores_a_and_sp() {
        let mut rig = Rig::new(&[Opcode::Psh.byte(), Opcode::Mba.byte(), Opcode::Pop.byte()]);
        rig.cpu.a = 0x42;
        rig.cpu.b = 0x07;
        rig.instruction();
        assert_eq!(rig.cpu.sp, 1);
        assert_eq!(rig.memory.read(0xFF), 0x42);
        rig.instruction();
        assert_eq!(rig.cpu.a, 0x07);
        rig.instruction();
        assert_eq!(rig.cpu.a, 0x42);
        assert_eq!(rig.cpu.sp, 0);
    }

    #[test]
    fn output_emits_a_once() {
        let mut rig = Rig::new(&[Opcode::Out.byte()]);
        rig.cpu.a = 77;
        let (_, outcomes) = rig.instruction();
        let emitted: Vec<u8> = outcomes.iter().filter_map(|o| o.output).collect();
        assert_eq!(emitted, vec![77]);
    }

    #[test]
    fn halt_is_reported_on_its_execute_step() {
        let mut rig = Rig::new(&[Opcode::Hlt.byte()]);
        assert!(!rig.tick().halted);
        assert!(!rig.tick().halted);
        assert!(rig.tick().halted);
    }

    #[test]
    fn undefined_opcode_is_an_error_and_leaves_state() {
        let mut rig = Rig::new(&[0x00]);
        rig.tick();
        rig.tick();
        let before = rig.cpu;
        let err = tick(&mut rig.cpu, &mut rig.memory, &MICROCODE, rig.stack).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidOpcode {
                opcode: 0x00,
                address: 0x00
            }
        );
        assert_eq!(rig.cpu, before);
    }

    #[test]
    fn step_past_last_clock_is_rejected() {
        let mut rig = Rig::new(&[Opcode::Nop.byte()]);
        rig.cpu.ir = Opcode::Nop.byte();
        rig.cpu.step = CLOCKS_PER_INSTR;
        let before = rig.cpu;
        let err = tick(&mut rig.cpu, &mut rig.memory, &MICROCODE, rig.stack).unwrap_err();
        assert_eq!(
            err,
            SimError::StepOutOfRange {
                step: CLOCKS_PER_INSTR,
                max: CLOCKS_PER_INSTR
            }
        );
        assert_eq!(rig.cpu, before);
    }

    #[test]
    fn pc_wraps_at_end_of_address_space() {
        let mut rig = Rig::new(&[]);
        rig.cpu.pc = 0xFF;
        rig.memory.write(0xFF, Opcode::Nop.byte());
        rig.instruction();
        assert_eq!(rig.cpu.pc, 0);
    }
}
