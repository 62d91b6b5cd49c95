//! Lark CLI - run and inspect AVM1 action streams.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "lark",
    version,
    about = "Run and inspect AVM1 action streams",
    long_about = "Lark executes raw DoAction / DoInitAction tag bodies.\n\n\
                  Run a stream:     lark run frame1.bin\n\
                  Disassemble it:   lark disasm frame1.bin --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute an action stream with the avmplus surface installed
    Run(commands::run::RunCommand),

    /// Print the decoded records of an action stream
    Disasm(commands::disasm::DisasmCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(cmd) => cmd.run(&config),
        Commands::Disasm(cmd) => cmd.run(),
    }
}
