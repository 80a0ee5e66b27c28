//! # Resolve Subcommand
//!
//! Signs + geobase → regulation zones, with the defect report written
//! beside them or to its own file.

use std::path::PathBuf;

use clap::Args;

use crate::files::{prepare_run, write_json};

/// Arguments for the resolve subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Signs, JSON array.
    #[arg(long)]
    pub signs: PathBuf,

    /// Geobase segments, JSON array.
    #[arg(long)]
    pub geobase: PathBuf,

    /// Engine configuration, YAML.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file for the zones.
    #[arg(long)]
    pub out: PathBuf,

    /// Separate output file for the defect report. Without it the report
    /// is written together with the zones.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Run the resolve subcommand.
pub fn run(args: &ResolveArgs) -> anyhow::Result<()> {
    let (engine, signs) = prepare_run(&args.signs, &args.geobase, args.config.as_ref())?;
    let output = engine.run(signs)?;

    match &args.report {
        Some(report_path) => {
            write_json(&args.out, &output.zones)?;
            write_json(report_path, &output.report)?;
        }
        None => write_json(&args.out, &output)?,
    }
    tracing::info!(
        zones = output.zones.len(),
        defects = output.report.defects.len(),
        out = %args.out.display(),
        "zones written"
    );
    Ok(())
}
