use retrobus_common::{FixedRate, NoPacing, Pacer};
use typed_builder::TypedBuilder;

use crate::consts::DEFAULT_STACK_SIZE;
use crate::cpu::CpuState;
use crate::engine::{self, TickOutcome};
use crate::error::SimError;
use crate::memory::{Memory, StackGeometry};
use crate::microcode::{MicrocodeTable, MICROCODE};


/// Tunables for one simulation run.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct MachineConfig {
    /// Number of reserved stack slots at the top of memory.
    #[builder(default = DEFAULT_STACK_SIZE)]
    pub stack_size: u8,
    /// Give up with [`SimError::CycleLimit`] after this many cycles.
    #[builder(default, setter(strip_option))]
    pub max_cycles: Option<u64>,
    /// Pace `run` to this clock frequency; unpaced when unset.
    #[builder(default, setter(strip_option))]
    pub clock_hz: Option<u32>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Final state of a halted machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub output: Vec<u8>,
    pub cycles: u64,
    pub cpu: CpuState,
}

impl RunReport {
    /// Register A at halt, handed back to the caller as the result.
    pub fn result_code(&self) -> u8 {
        self.cpu.a
    }
}

/// CPU, memory and control ROM wired together.
///
/// The machine owns its state for the whole run. The only way out of a run
/// is the halt signal, or an error.
pub struct Machine<'t> {
    cpu: CpuState,
    memory: Memory,
    table: &'t MicrocodeTable,
    stack: StackGeometry,
    config: MachineConfig,
    output: Vec<u8>,
    cycles: u64,
    halted: bool,
}

impl Machine<'static> {
    /// Machine backed by the shared microcode table.
    pub fn new(config: MachineConfig, image: &[u8]) -> Result<Self, SimError> {
        Machine::with_table(&MICROCODE, config, image)
    }
}

impl<'t> Machine<'t> {
    /// Machine backed by an explicit table, which is validated first.
    pub fn with_table(
        table: &'t MicrocodeTable,
        config: MachineConfig,
        image: &[u8],
    ) -> Result<Self, SimError> {
        table.validate()?;
        let stack = StackGeometry::new(config.stack_size)?;
        let memory = Memory::load(image, stack)?;
        log::info!(
            "machine ready: {} byte program, {} stack slots",
            image.len(),
            stack.size()
        );
        Ok(Self {
            cpu: CpuState::new(),
            memory,
            table,
            stack,
            config,
            output: Vec::new(),
            cycles: 0,
            halted: false,
        })
    }

    pub fn cpu(&self) -> &CpuState {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Advance one clock cycle.
    pub fn tick(&mut self) -> Result<TickOutcome, SimError> {
        if self.halted {
            return Err(SimError::Halted);
        }
        let outcome = engine::tick(&mut self.cpu, &mut self.memory, self.table, self.stack)?;
        self.cycles += 1;
        if let Some(byte) = outcome.output {
            log::debug!("output: {}", byte);
            self.output.push(byte);
        }
        if outcome.halted {
            self.halted = true;
            log::info!("halted after {} cycles, A={}", self.cycles, self.cpu.a);
        }
        Ok(outcome)
    }

    /// Run until halt, paced as configured.
    pub fn run(&mut self) -> Result<RunReport, SimError> {
        match self.config.clock_hz {
            Some(hz) => self.run_with(&mut FixedRate::new(hz)),
            None => self.run_with(&mut NoPacing),
        }
    }

    /// Run until halt, calling `pacer` after every cycle.
    pub fn run_with(&mut self, pacer: &mut impl Pacer) -> Result<RunReport, SimError> {
        while !self.halted {
            if let Some(limit) = self.config.max_cycles {
                if self.cycles >= limit {
                    return Err(SimError::CycleLimit {
                        cycles: self.cycles,
                    });
                }
            }
            self.tick()?;
            pacer.pace();
        }
        Ok(self.report())
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            output: self.output.clone(),
            cycles: self.cycles,
            cpu: self.cpu,
        }
    }
}
