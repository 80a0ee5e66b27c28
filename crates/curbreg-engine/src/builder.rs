//! # Regulation Builder
//!
//! Turns zone drafts into validated `RegulationZone` records. No business
//! logic lives here: the builder converts, re-checks every zone invariant
//! and checks that each input sign is accounted for exactly once. Any
//! failure is an `InvariantViolation` and the batch yields nothing.

use std::collections::HashMap;

use curbreg_core::{InvariantViolation, LocationRange, RegulationZone, SignId, TimeWindow};
use curbreg_geobase::Geobase;

use crate::consolidate::ZoneDraft;
use crate::report::Report;

/// Build and validate one zone.
pub fn build_zone(
    draft: ZoneDraft,
    geobase: &Geobase,
    epsilon: f64,
) -> Result<RegulationZone, InvariantViolation> {
    let segment = geobase
        .get(&draft.segment_id)
        .ok_or_else(|| InvariantViolation::UnknownSegment {
            segment_id: draft.segment_id.to_string(),
        })?;
    let provenance = draft
        .source_sign_ids
        .first()
        .cloned()
        .ok_or_else(|| InvariantViolation::EmptyProvenance {
            segment_id: draft.segment_id.to_string(),
        })?;

    let sig = draft.signature;
    let time_windows = sig
        .time_windows
        .iter()
        .map(|w| TimeWindow::from_raw(&provenance, w))
        .collect::<Result<Vec<_>, _>>()?;
    let date_range = match sig.date_range {
        None => None,
        Some(raw) => Some(raw.complete().ok_or_else(|| {
            InvariantViolation::PartialDateRange {
                sign_id: provenance.to_string(),
            }
        })?),
    };

    let zone = RegulationZone {
        segment_id: draft.segment_id,
        side_of_street: draft.side,
        nature: sig.nature,
        activity: sig.activity,
        vehicle_type: sig.vehicle_type,
        vehicle_exception: sig.vehicle_exception,
        time_windows,
        date_range,
        max_stay_minutes: sig.max_stay_minutes,
        disabled_permit_exempt: sig.disabled_permit_exempt,
        point_regulation: draft.point_regulation,
        location_range: LocationRange::new(draft.start, draft.end),
        source_sign_ids: draft.source_sign_ids,
    };
    zone.validate(segment.length(), epsilon)?;
    Ok(zone)
}

/// Build every draft; the first violation aborts.
pub fn build_zones(
    drafts: Vec<ZoneDraft>,
    geobase: &Geobase,
    epsilon: f64,
) -> Result<Vec<RegulationZone>, InvariantViolation> {
    drafts
        .into_iter()
        .map(|d| build_zone(d, geobase, epsilon))
        .collect()
}

/// Every input sign must be cited by exactly one zone or exactly one
/// exclusion.
pub fn check_accounting(
    input: &[SignId],
    zones: &[RegulationZone],
    report: &Report,
) -> Result<(), InvariantViolation> {
    let mut counts: HashMap<&SignId, usize> = HashMap::with_capacity(input.len());
    for id in zones
        .iter()
        .flat_map(|z| z.source_sign_ids.iter())
        .chain(report.excluded_sign_ids())
    {
        *counts.entry(id).or_insert(0) += 1;
    }
    for id in input {
        match counts.get(id).copied().unwrap_or(0) {
            1 => {}
            0 => {
                return Err(InvariantViolation::SignUnaccounted {
                    sign_id: id.to_string(),
                })
            }
            count => {
                return Err(InvariantViolation::SignAccountedTwice {
                    sign_id: id.to_string(),
                    count,
                })
            }
        }
    }
    Ok(())
}
