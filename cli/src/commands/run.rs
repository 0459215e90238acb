use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use sm16_emulator::assemble;
use sm16_emulator::controller::Controller;
use tracing::{debug, info};

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Input file. The built-in array-maximum program runs when omitted
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<Utf8PathBuf>,

    /// Delay between steps, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    delay: u64,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let mut controller = Controller::new();

        if let Some(path) = &self.input {
            info!(path = %path, "Reading program");
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {path}"))?;
            let program = assemble(&source)?;
            controller.load(&program);
        } else {
            debug!("No input file, loading the built-in program");
            controller.load_default();
        }

        info!("Running program");
        controller
            .run(Duration::from_millis(self.delay))
            .context("could not start execution")?;
        controller.wait();

        if let Some(fault) = controller.last_error() {
            return Err(fault).context("execution faulted");
        }

        let snapshot = controller.snapshot();
        for line in &snapshot.state.output {
            println!("{line}");
        }

        info!(registers = %snapshot.state.registers, "End of program");

        Ok(())
    }
}
