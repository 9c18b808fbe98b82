//! Development tasks for the NPC dialogue workspace
//!
//! This binary provides authoring and debugging utilities using the
//! cargo-xtask pattern. Run with: `cargo xtask <command>`

mod commands;
mod dirs;
mod logging;

use anyhow::Result;
use clap::Parser;
use commands::{Plan, Play, PrintPlans, Simulate, Synthesize, Validate};

/// Development tasks for the NPC dialogue workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Authoring tools for NPC dialogue worlds", long_about = None)]
#[command(version)]
struct Cli {
    /// Also write logs to the platform log directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load an atlas and report dead content
    Validate(Validate),

    /// Write the planning domain and problem for a character
    Synthesize(Synthesize),

    /// Solve a character's route to its goal
    Plan(Plan),

    /// Replay candidate traces in parallel
    Simulate(Simulate),

    /// Pretty-print a JSON plan listing
    PrintPlans(PrintPlans),

    /// Talk to a character interactively
    Play(Play),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for NPC_* overrides and RUST_LOG)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::init(cli.log_file)?;

    match cli.command {
        Command::Validate(cmd) => cmd.execute(),
        Command::Synthesize(cmd) => cmd.execute(),
        Command::PrintPlans(cmd) => cmd.execute(),
        Command::Plan(cmd) => block_on(cmd.execute()),
        Command::Simulate(cmd) => block_on(cmd.execute()),
        Command::Play(cmd) => block_on(cmd.execute()),
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
