//! # curbreg CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Curb regulation engine: physical signs to regulation zones.
#[derive(Parser, Debug)]
#[command(name = "curbreg", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Resolve signs into regulation zones.
    Resolve(curbreg_cli::resolve::ResolveArgs),
    /// Convert an inventory export into signs.
    Inventory(curbreg_cli::inventory::InventoryArgs),
    /// Run the engine and summarize defects.
    Check(curbreg_cli::check::CheckArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Commands::Resolve(args) => curbreg_cli::resolve::run(args),
        Commands::Inventory(args) => curbreg_cli::inventory::run(args),
        Commands::Check(args) => curbreg_cli::check::run(args),
    }
}
