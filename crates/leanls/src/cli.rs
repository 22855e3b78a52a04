use std::ffi::OsString;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::LeanlsCommand;
use crate::exit::Exit;

/// The main CLI structure that defines the command-line interface
#[derive(Parser)]
#[command(name = "leanls")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: LeanlsCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments and execute the chosen command
pub fn run<I, T>(args: I) -> Result<Exit>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    // The server sets up its own logging once it has a client to talk to.
    if !matches!(cli.command, LeanlsCommand::Serve(_)) {
        init_stderr_logging(&cli.args);
    }

    cli.command.execute(&cli.args)
}

fn init_stderr_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(args.global.log_level().into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
