//! # Inventory Subcommand
//!
//! Converts a raw inventory export into the sign array `resolve` reads.

use std::path::PathBuf;

use clap::Args;

use curbreg_inventory::{assemble_signs, RawInventoryRow};

use crate::files::{read_json, write_json};

/// Arguments for the inventory subcommand.
#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// Inventory rows, JSON array.
    #[arg(long)]
    pub rows: PathBuf,

    /// Output file for the signs.
    #[arg(long)]
    pub out: PathBuf,

    /// Fail when any row cannot be read.
    #[arg(long)]
    pub strict: bool,
}

/// Run the inventory subcommand.
pub fn run(args: &InventoryArgs) -> anyhow::Result<()> {
    let rows: Vec<RawInventoryRow> = read_json(&args.rows)?;
    let assembly = assemble_signs(&rows);

    for e in &assembly.errors {
        eprintln!("skipped: {e}");
    }
    if args.strict && !assembly.errors.is_empty() {
        anyhow::bail!("{} inventory rows could not be read", assembly.errors.len());
    }

    write_json(&args.out, &assembly.signs)?;
    println!(
        "{} rows -> {} signs ({} skipped)",
        rows.len(),
        assembly.signs.len(),
        assembly.errors.len()
    );
    Ok(())
}
