use anyhow::{Context, Result};
use retrobus::ProgramSource;
use retrobus_cpu::MachineConfig;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let program_path = args.next().unwrap_or_default();
    let clock_hz = args
        .next()
        .map(|hz| hz.parse::<u32>())
        .transpose()
        .context("clock speed must be a whole number of Hz")?;

    let config = match clock_hz {
        Some(hz) => MachineConfig::builder().clock_hz(hz).build(),
        None => MachineConfig::default(),
    };

    let report = if program_path.is_empty() {
        log::info!("No program path provided, running bundled countdown");
        retrobus::run(ProgramSource::Assembly(retrobus::programs::COUNTDOWN), config)?
    } else if program_path.ends_with(".asm") {
        log::info!("Assembling program: '{}'", program_path);
        let text = std::fs::read_to_string(&program_path)
            .with_context(|| format!("failed to read {program_path}"))?;
        retrobus::run(ProgramSource::Assembly(&text), config)?
    } else {
        log::info!("Loading program image: '{}'", program_path);
        let bytes =
            std::fs::read(&program_path).with_context(|| format!("failed to read {program_path}"))?;
        retrobus::run(ProgramSource::Image(&bytes), config)?
    };

    for byte in &report.output {
        println!("{byte}");
    }
    println!("Finished after {} clock cycles", report.cycles);
    println!("{}", report.cpu);
    std::process::exit(report.result_code() as i32);
}
