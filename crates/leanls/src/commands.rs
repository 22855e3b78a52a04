mod check;
mod resolve;
mod serve;

use anyhow::Result;
use clap::Subcommand;

use crate::args::Args;
use crate::exit::Exit;

pub trait Command {
    fn execute(&self, args: &Args) -> Result<Exit>;
}

#[derive(Debug, Subcommand)]
pub enum LeanlsCommand {
    /// Start the LSP server
    Serve(self::serve::Serve),
    /// Show which project and toolchain govern each path
    Resolve(self::resolve::Resolve),
    /// Check that workspace folders are Lean 4 projects
    Check(self::check::Check),
}

impl Command for LeanlsCommand {
    fn execute(&self, args: &Args) -> Result<Exit> {
        match self {
            Self::Serve(command) => command.execute(args),
            Self::Resolve(command) => command.execute(args),
            Self::Check(command) => command.execute(args),
        }
    }
}
