//! # Check Subcommand
//!
//! Runs the engine without writing zones and prints how many defects of
//! each kind the batch produced.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;

use curbreg_engine::{DefectKind, EngineOutput, Severity};

use crate::files::prepare_run;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Signs, JSON array.
    #[arg(long)]
    pub signs: PathBuf,

    /// Geobase segments, JSON array.
    #[arg(long)]
    pub geobase: PathBuf,

    /// Engine configuration, YAML.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exit with an error when any error-severity defect is found.
    #[arg(long)]
    pub deny_errors: bool,
}

/// Per-kind table of a run.
pub fn summary_table(output: &EngineOutput) -> String {
    let counts = output.report.summary();
    let mut table = String::new();
    for kind in DefectKind::ALL {
        let n = counts.get(&kind).copied().unwrap_or(0);
        if n > 0 {
            let _ = writeln!(
                table,
                "{:<32} {:>7} {:>6}",
                kind.as_str(),
                kind.severity().as_str(),
                n
            );
        }
    }
    let _ = writeln!(
        table,
        "{} zones, {} defects, {} signs excluded",
        output.zones.len(),
        output.report.defects.len(),
        output.report.excluded_sign_ids().count()
    );
    table
}

/// Run the check subcommand.
pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    let (engine, signs) = prepare_run(&args.signs, &args.geobase, args.config.as_ref())?;
    let output = engine.run(signs)?;
    print!("{}", summary_table(&output));

    let errors = output.report.count_at_least(Severity::Error);
    if args.deny_errors && errors > 0 {
        anyhow::bail!("{errors} error-severity defects");
    }
    Ok(())
}
