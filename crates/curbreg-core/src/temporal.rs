//! # Temporal Primitives
//!
//! Time-of-day spans, day-of-week sets, seasonal (year-less) date bounds and
//! the tri-state flag used by the inventory for every "exception" column.
//!
//! ## Conventions
//!
//! - An empty `DaySet` means the regulation applies every day. Overlap tests
//!   use [`DaySet::coverage`] so an unrestricted window overlaps everything.
//! - `SeasonDay` has no year. Month/day validity is checked against a leap
//!   year so `02-29` is accepted.
//! - A `DateRange` may wrap the year (`11-15` to `04-01`).

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CurbError;

/// Weekdays in ISO order, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const ALL_DAYS_MASK: u8 = 0b111_1111;

// ─── Tri-state ───────────────────────────────────────────────────────

/// A yes/no column that may also be missing in the source.
///
/// The inventory records these as `oui` / `non` / empty; both the French and
/// English spellings deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Explicitly yes.
    #[serde(alias = "oui")]
    Yes,
    /// Explicitly no.
    #[serde(alias = "non")]
    No,
    /// Not recorded.
    #[default]
    Absent,
}

impl TriState {
    /// The recorded value, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Absent => None,
        }
    }

    /// Whether the flag is set. `Absent` reads as not set.
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for TriState {
    fn from(b: bool) -> Self {
        if b {
            Self::Yes
        } else {
            Self::No
        }
    }
}

// ─── Days of week ────────────────────────────────────────────────────

/// A set of weekdays stored as a 7-bit mask (bit 0 = Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaySet(u8);

impl DaySet {
    /// No day recorded (applies every day).
    pub const EMPTY: DaySet = DaySet(0);
    /// Every day, explicitly.
    pub const ALL: DaySet = DaySet(ALL_DAYS_MASK);

    /// Build a set from weekdays.
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut set = Self::EMPTY;
        for d in days {
            set.insert(d);
        }
        set
    }

    /// Inclusive range in ISO order, `Mon..=Fri` style. A range whose end
    /// precedes its start wraps through Sunday (`Sat..=Mon`).
    pub fn range(first: Weekday, last: Weekday) -> Self {
        let mut set = Self::EMPTY;
        let mut day = first;
        loop {
            set.insert(day);
            if day == last {
                break;
            }
            day = day.succ();
        }
        set
    }

    /// Add a weekday.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    /// Whether `day` is in the set.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Whether no day was recorded.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Days actually covered: an empty set covers the whole week.
    pub fn coverage(&self) -> DaySet {
        if self.is_empty() {
            Self::ALL
        } else {
            *self
        }
    }

    /// Whether the covered days of both sets intersect.
    pub fn overlaps(&self, other: &DaySet) -> bool {
        self.coverage().0 & other.coverage().0 != 0
    }

    /// The weekdays in ISO order.
    pub fn days(&self) -> Vec<Weekday> {
        WEEK.iter().copied().filter(|d| self.contains(*d)).collect()
    }
}

impl From<Vec<Weekday>> for DaySet {
    fn from(days: Vec<Weekday>) -> Self {
        Self::from_days(days)
    }
}

impl From<DaySet> for Vec<Weekday> {
    fn from(set: DaySet) -> Self {
        set.days()
    }
}

// ─── Time of day ─────────────────────────────────────────────────────

/// A time-of-day span with both bounds present.
///
/// `end < start` is a span across midnight (`22:00–07:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start time.
    pub start: NaiveTime,
    /// End time.
    pub end: NaiveTime,
}

impl TimeSpan {
    /// Create a span.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// `00:00:00–00:00:00`: expresses nothing and must be dropped.
    pub fn is_vacuous(&self) -> bool {
        is_midnight(&self.start) && is_midnight(&self.end)
    }
}

/// Whether a time is exactly `00:00:00`.
pub fn is_midnight(t: &NaiveTime) -> bool {
    t.num_seconds_from_midnight() == 0 && t.nanosecond() == 0
}

// ─── Seasonal dates ──────────────────────────────────────────────────

/// A year-less calendar day, rendered `MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeasonDay {
    month: u32,
    day: u32,
}

impl SeasonDay {
    /// Validate a month/day pair (leap year rules, so `02-29` is valid).
    pub fn new(month: u32, day: u32) -> Result<Self, CurbError> {
        NaiveDate::from_ymd_opt(2000, month, day)
            .map(|_| Self { month, day })
            .ok_or_else(|| CurbError::InvalidValue(format!("invalid month/day {month:02}-{day:02}")))
    }

    /// Last day of `month`, leap-year aware.
    pub fn end_of_month(month: u32) -> Result<Self, CurbError> {
        let last = (28..=31)
            .rev()
            .find(|d| NaiveDate::from_ymd_opt(2000, month, *d).is_some())
            .ok_or_else(|| CurbError::InvalidValue(format!("invalid month {month}")))?;
        Ok(Self { month, day: last })
    }

    /// Month, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Day of month, 1-based.
    pub fn day(&self) -> u32 {
        self.day
    }
}

impl std::fmt::Display for SeasonDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl std::str::FromStr for SeasonDay {
    type Err = CurbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (m, d) = s
            .split_once('-')
            .ok_or_else(|| CurbError::InvalidValue(format!("expected MM-DD, got {s:?}")))?;
        let month = m
            .trim()
            .parse()
            .map_err(|_| CurbError::InvalidValue(format!("bad month in {s:?}")))?;
        let day = d
            .trim()
            .parse()
            .map_err(|_| CurbError::InvalidValue(format!("bad day in {s:?}")))?;
        Self::new(month, day)
    }
}

impl TryFrom<String> for SeasonDay {
    type Error = CurbError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SeasonDay> for String {
    fn from(d: SeasonDay) -> Self {
        d.to_string()
    }
}

/// A seasonal applicability range with both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    /// First day (inclusive).
    pub start: SeasonDay,
    /// Last day (inclusive).
    pub end: SeasonDay,
}

impl DateRange {
    /// Whether the range crosses December 31st.
    pub fn wraps_year(&self) -> bool {
        self.end < self.start
    }
}
