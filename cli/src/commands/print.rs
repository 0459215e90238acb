use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};
use sm16_emulator::assemble;
use sm16_emulator::runtime::disassemble;
use tracing::{debug, info};

#[derive(Parser, Debug)]
pub struct PrintOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl PrintOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        info!(path = %self.input, "Reading program");
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("could not read {}", self.input))?;

        debug!("Assembling program");
        let program = assemble(&source)?;

        for (address, cell) in disassemble(&program.instructions).into_iter().enumerate() {
            println!("{address:>4}  {cell}");
        }

        for array in &program.arrays {
            let values = array
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("{:>4}  {} [{values}]", array.start, array.name);
        }

        Ok(())
    }
}
