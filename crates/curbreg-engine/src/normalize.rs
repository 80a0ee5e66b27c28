//! # Attribute Normalizer
//!
//! Cleans one sign's recorded fields. Each problem found is one defect; the
//! sign itself keeps going unless the temporal-exception policy rejects it.
//!
//! ## Rules
//!
//! 1. A window with exactly one of start/end is dropped (`IncompleteTimeWindow`).
//! 2. A `00:00–00:00` window is dropped (`VacuousTimeWindow`); the other
//!    windows are kept.
//! 3. A date range with one bound is dropped (`IncompleteDateRange`). An
//!    empty range collapses to no range.
//! 4. Any two windows whose day coverage overlaps must agree on the
//!    exception flag, wherever they sit in the list. A missing flag reads as
//!    "not an exception". On disagreement one `InconsistentTemporalException`
//!    is reported and the configured policy applies to each group of windows
//!    linked by overlapping days.
//!
//! Normalizing an already normalized sign returns it unchanged with no
//! defects.

use curbreg_core::{RawTimeWindow, Sign, TriState};

use crate::config::TemporalExceptionPolicy;
use crate::report::{Defect, DefectKind, Resolution};

/// Output of normalizing one sign.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    /// The cleaned sign.
    pub sign: Sign,
    /// Field-level defects, in detection order.
    pub defects: Vec<Defect>,
    /// The sign must not reach consolidation. The exclusion defect is in
    /// `defects`.
    pub rejected: bool,
}

/// Normalize one sign.
pub fn normalize(mut sign: Sign, policy: TemporalExceptionPolicy) -> Normalization {
    let mut defects = Vec::new();

    let recorded = std::mem::take(&mut sign.time_windows);
    for (i, window) in recorded.into_iter().enumerate() {
        if window.is_half_open() {
            defects.push(
                Defect::new(DefectKind::IncompleteTimeWindow, &sign.id, Resolution::FieldDropped)
                    .field(format!("time_windows[{i}]"))
                    .detail(format!(
                        "start={:?} end={:?}",
                        window.start, window.end
                    )),
            );
            continue;
        }
        if window.span().map_or(false, |s| s.is_vacuous()) {
            defects.push(
                Defect::new(DefectKind::VacuousTimeWindow, &sign.id, Resolution::FieldDropped)
                    .field(format!("time_windows[{i}]")),
            );
            continue;
        }
        sign.time_windows.push(window);
    }

    if let Some(range) = sign.date_range {
        if range.is_half_open() {
            defects.push(
                Defect::new(DefectKind::IncompleteDateRange, &sign.id, Resolution::FieldDropped)
                    .field("date_range")
                    .detail(format!(
                        "start={} end={}",
                        display_opt(range.start),
                        display_opt(range.end)
                    )),
            );
            sign.date_range = None;
        } else if range.complete().is_none() {
            sign.date_range = None;
        }
    }

    let conflicts = conflicting_pairs(&sign.time_windows);
    let mut rejected = false;
    if !conflicts.is_empty() {
        let pairs = conflicts
            .iter()
            .map(|(i, j)| format!("{i}/{j}"))
            .collect::<Vec<_>>()
            .join(",");
        let base = Defect::new(
            DefectKind::InconsistentTemporalException,
            &sign.id,
            Resolution::FlagOverwritten,
        )
        .field("time_windows.temporal_exception");
        let defect = match policy {
            TemporalExceptionPolicy::EarliestWins => {
                earliest_wins(&mut sign.time_windows);
                base.detail(format!("conflicting windows {pairs}; earliest flag kept"))
            }
            TemporalExceptionPolicy::LatestWins => {
                latest_wins(&mut sign.time_windows);
                base.detail(format!("conflicting windows {pairs}; latest flag kept"))
            }
            TemporalExceptionPolicy::RejectSign => {
                rejected = true;
                let mut d = base.excluding(&sign.id);
                d.resolution = Resolution::SignExcluded;
                d.detail(format!("conflicting windows {pairs}; sign rejected"))
            }
        };
        defects.push(defect);
    }

    Normalization {
        sign,
        defects,
        rejected,
    }
}

fn display_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

fn flag(w: &RawTimeWindow) -> bool {
    w.temporal_exception == TriState::Yes
}

fn conflicts(a: &RawTimeWindow, b: &RawTimeWindow) -> bool {
    a.days.overlaps(&b.days) && flag(a) != flag(b)
}

/// Every pair `(i, j)`, `i < j`, whose days overlap and whose flags disagree.
fn conflicting_pairs(windows: &[RawTimeWindow]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for j in 1..windows.len() {
        for i in 0..j {
            if conflicts(&windows[i], &windows[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Label of each window: the smallest index of the windows it is linked to
/// through overlapping day coverage, directly or by a chain.
fn overlap_groups(windows: &[RawTimeWindow]) -> Vec<usize> {
    let mut group: Vec<usize> = (0..windows.len()).collect();
    for j in 1..windows.len() {
        for i in 0..j {
            if group[i] != group[j] && windows[i].days.overlaps(&windows[j].days) {
                let (keep, merge) = (group[i].min(group[j]), group[i].max(group[j]));
                for g in group.iter_mut().filter(|g| **g == merge) {
                    *g = keep;
                }
            }
        }
    }
    group
}

/// Give every window of a group the flag of the group member picked by
/// `winner`.
fn align_groups(windows: &mut [RawTimeWindow], winner: impl Fn(&[usize], usize) -> usize) {
    let group = overlap_groups(windows);
    for k in 0..windows.len() {
        let source = winner(&group, k);
        if flag(&windows[k]) != flag(&windows[source]) {
            windows[k].temporal_exception = windows[source].temporal_exception;
        }
    }
}

fn earliest_wins(windows: &mut [RawTimeWindow]) {
    align_groups(windows, |group, k| group[k]);
}

fn latest_wins(windows: &mut [RawTimeWindow]) {
    align_groups(windows, |group, k| {
        group
            .iter()
            .rposition(|g| *g == group[k])
            .unwrap_or(k)
    });
}
