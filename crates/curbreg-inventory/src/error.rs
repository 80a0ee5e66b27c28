//! Inventory parsing errors.
//!
//! A row that cannot be read is reported and skipped; parsing never panics
//! on inventory content.

use thiserror::Error;

/// A value in one inventory row could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InventoryError {
    /// A day name outside `lundi`..`dimanche`.
    #[error("unknown day expression {0:?}")]
    UnknownDay(String),

    /// A month name outside `janvier`..`décembre`.
    #[error("unknown month {0:?}")]
    UnknownMonth(String),

    /// A time that is not `HH:MM[:SS]`.
    #[error("invalid time {0:?}")]
    InvalidTime(String),

    /// Months recorded without a start or end day.
    #[error("months recorded without start/end day")]
    MonthsWithoutDays,

    /// Start or end day recorded without months.
    #[error("start/end day recorded without months")]
    DaysWithoutMonths,

    /// The recorded months do not form one consecutive run. The whole panel
    /// is dropped rather than guessing a season.
    #[error("months {0} are not one consecutive run; panel dropped")]
    DisjointMonths(String),

    /// A numeric column holds something else.
    #[error("column {column} is not a number: {value:?}")]
    InvalidNumber {
        /// Column name in the inventory export.
        column: &'static str,
        /// Value as recorded.
        value: String,
    },

    /// A required column is empty.
    #[error("column {0} is empty")]
    MissingValue(&'static str),

    /// A sub-plate refers to no panel on the batch.
    #[error("sub-plate refers to unknown panel {0:?}")]
    OrphanSubPlate(String),
}

/// An `InventoryError` located in the input.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row} (panel {panel}): {source}")]
pub struct RowError {
    /// Zero-based row index.
    pub row: usize,
    /// `globalid_panneau` of the row, or empty.
    pub panel: String,
    /// What went wrong.
    pub source: InventoryError,
}
