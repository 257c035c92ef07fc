use anyhow::{Context, Result};
use retrobus_cpu::{assemble, Machine, MachineConfig, RunReport, StackGeometry};

/// Demo programs shipped with the runner.
pub mod programs {
    pub const COUNTDOWN: &str = include_str!("../../../assets/programs/countdown.asm");
    pub const POWERS: &str = include_str!("../../../assets/programs/powers.asm");
    pub const CALLS: &str = include_str!("../../../assets/programs/calls.asm");
}

pub enum ProgramSource<'a> {
    /// Assembly text, padded to the program region after assembling.
    Assembly(&'a str),
    /// A ready-made image that must fill the program region exactly.
    Image(&'a [u8]),
}

pub fn run(source: ProgramSource, config: MachineConfig) -> Result<RunReport> {
    let stack = StackGeometry::new(config.stack_size)?;
    let image = match source {
        ProgramSource::Assembly(text) => assemble(text)
            .and_then(|assembly| assembly.into_image(stack))
            .context("failed to assemble program")?,
        ProgramSource::Image(bytes) => bytes.to_vec(),
    };

    let mut machine = Machine::new(config, &image).context("failed to load program")?;
    let report = machine.run().context("simulation aborted")?;
    log::info!(
        "finished after {} clock cycles, {} bytes of output",
        report.cycles,
        report.output.len()
    );
    Ok(report)
}
