//! # curbreg-inventory — Civic Sign Inventory Parsing
//!
//! Reads the flat sign inventory export and produces `Sign` records for the
//! engine.
//!
//! - **Rows** (`row.rs`): the export schema, column names as published.
//!
//! - **Calendar** (`calendar.rs`): French day and month expressions, times
//!   of day, seasonal ranges.
//!
//! - **Assembly** (`assemble.rs`): merges period rows per panel and
//!   attaches sub-plates to their panel.
//!
//! No cleaning happens here. A half-open period is passed through as
//! recorded so the engine can report it.

pub mod assemble;
pub mod calendar;
pub mod error;
pub mod row;

pub use assemble::{assemble_signs, sign_from_row, Assembly};
pub use calendar::{parse_days, parse_season, parse_time};
pub use error::{InventoryError, RowError};
pub use row::{Cell, RawInventoryRow};
