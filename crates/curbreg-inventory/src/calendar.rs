//! French day, month and time expressions used by the inventory.
//!
//! Days: `lundi`..`dimanche`, ranges `a-b` (wrapping through Sunday),
//! unions `a+b`, and `,` read as a range separator. `dim-sam` is every day.
//!
//! Months: `janvier`..`décembre`, comma separated. Together with the start
//! and end day they give one seasonal range. The months must form a single
//! consecutive run, possibly across the new year (`novembre,décembre,janvier`).

use chrono::{NaiveTime, Weekday};

use curbreg_core::{DaySet, RawDateRange, SeasonDay};

use crate::error::InventoryError;

const DAYS: [(&str, Weekday); 7] = [
    ("lundi", Weekday::Mon),
    ("mardi", Weekday::Tue),
    ("mercredi", Weekday::Wed),
    ("jeudi", Weekday::Thu),
    ("vendredi", Weekday::Fri),
    ("samedi", Weekday::Sat),
    ("dimanche", Weekday::Sun),
];

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

fn day(name: &str) -> Result<Weekday, InventoryError> {
    let name = name.trim().to_lowercase();
    DAYS.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, d)| *d)
        .ok_or(InventoryError::UnknownDay(name))
}

/// Parse a day expression.
pub fn parse_days(expr: &str) -> Result<DaySet, InventoryError> {
    let expr = expr.trim().to_lowercase().replace(',', "-");
    if expr == "dim-sam" {
        return Ok(DaySet::ALL);
    }

    let mut set = DaySet::EMPTY;
    for part in expr.split('+') {
        let part = part.trim();
        match part.split_once('-') {
            Some((first, last)) => {
                // "a-b-c" (from "a,b,c") spans first to last.
                let last = last.rsplit('-').next().unwrap_or(last);
                for d in DaySet::range(day(first)?, day(last)?).days() {
                    set.insert(d);
                }
            }
            None => set.insert(day(part)?),
        }
    }
    Ok(set)
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime, InventoryError> {
    let v = value.trim();
    NaiveTime::parse_from_str(v, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(v, "%H:%M"))
        .or_else(|_| NaiveTime::parse_from_str(v, "%Hh%M"))
        .map_err(|_| InventoryError::InvalidTime(value.to_string()))
}

fn month(name: &str) -> Result<u32, InventoryError> {
    let name = name.trim().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
        .ok_or(InventoryError::UnknownMonth(name))
}

fn clamped(month: u32, day: u32) -> Result<SeasonDay, InventoryError> {
    let last = SeasonDay::end_of_month(month)
        .map_err(|_| InventoryError::UnknownMonth(month.to_string()))?;
    SeasonDay::new(month, day.clamp(1, last.day()))
        .map_err(|_| InventoryError::UnknownMonth(month.to_string()))
}

/// Build the seasonal range from the month list and start/end days.
///
/// No months and no days is no range. A missing start day reads as the
/// first of the month, a missing end day as the last. Days past the end of
/// their month are clamped.
pub fn parse_season(
    months: Option<&str>,
    start_day: Option<u32>,
    end_day: Option<u32>,
) -> Result<Option<RawDateRange>, InventoryError> {
    let months = match months.map(str::trim).filter(|m| !m.is_empty()) {
        None if start_day.is_none() && end_day.is_none() => return Ok(None),
        None => return Err(InventoryError::DaysWithoutMonths),
        Some(_) if start_day.is_none() && end_day.is_none() => {
            return Err(InventoryError::MonthsWithoutDays)
        }
        Some(m) => m,
    };

    let mut list = months.split(',').map(month).collect::<Result<Vec<_>, _>>()?;
    list.sort_unstable();
    list.dedup();

    let (first, last) = consecutive_run(&list)
        .ok_or_else(|| InventoryError::DisjointMonths(months.to_string()))?;

    Ok(Some(RawDateRange {
        start: Some(clamped(first, start_day.unwrap_or(1))?),
        end: Some(clamped(last, end_day.unwrap_or(31))?),
    }))
}

/// First and last month of a single run over the sorted month numbers,
/// allowing one wrap from December to January.
fn consecutive_run(sorted: &[u32]) -> Option<(u32, u32)> {
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    let breaks: Vec<usize> = sorted
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] != w[0] + 1)
        .map(|(i, _)| i)
        .collect();
    match breaks.as_slice() {
        [] => Some((first, last)),
        // e.g. [1, 2, 11, 12]: runs 11..12 then 1..2
        [i] if first == 1 && last == 12 => Some((sorted[i + 1], sorted[*i])),
        _ => None,
    }
}
