//! # curbreg-cli — Curb Regulation Command-Line Interface
//!
//! ## Subcommands
//!
//! - `resolve` — signs + geobase → regulation zones and defect report
//! - `inventory` — raw inventory export → signs
//! - `check` — run the engine and print a per-kind defect summary
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the domain crates; no resolution logic here.
//! - Errors are `anyhow` with the offending path in the context.

pub mod check;
pub mod files;
pub mod inventory;
pub mod resolve;
