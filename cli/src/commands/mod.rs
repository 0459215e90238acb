mod completion;
mod print;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Assemble and run a program
    Run(self::run::RunOpt),

    /// Print the assembled program listing
    Print(self::print::PrintOpt),

    /// Generate shell completion scripts
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Subcommand::Run(opt) => opt.exec(),
            Subcommand::Print(opt) => opt.exec(),
            Subcommand::Completion(opt) => opt.exec(),
        }
    }
}
