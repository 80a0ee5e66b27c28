//! # Duplicate Sign Detection
//!
//! The inventory sometimes records the same panel twice under different
//! ids. Two signs are duplicates when every attribute except the id is
//! equal after normalization and inference. Positions are compared at
//! millimetre resolution.

use std::collections::HashMap;

use serde::Serialize;

use curbreg_core::{
    fingerprint, Activity, BoundaryRole, CanonicalBytes, CanonicalizationError, Fingerprint,
    RawDateRange, RawTimeWindow, RegulationNature, SegmentId, SideOfStreet, Sign, SignId,
    VehicleType,
};

use crate::report::{Defect, DefectKind};

#[derive(Serialize)]
struct FingerprintPayload<'a> {
    x_mm: i64,
    y_mm: i64,
    nature: RegulationNature,
    activity: Activity,
    vehicle_type: &'a Option<VehicleType>,
    vehicle_exception: bool,
    time_windows: &'a [RawTimeWindow],
    date_range: &'a Option<RawDateRange>,
    boundary_role: BoundaryRole,
    raw_segment_hint: &'a Option<SegmentId>,
    side_of_street: Option<SideOfStreet>,
    max_stay_minutes: Option<u32>,
    disabled_permit_exempt: bool,
    point_regulation: bool,
}

fn to_mm(metres: f64) -> i64 {
    (metres * 1000.0).round() as i64
}

/// Content fingerprint of a normalized sign with its resolved exception.
pub fn sign_fingerprint(
    sign: &Sign,
    vehicle_exception: bool,
) -> Result<Fingerprint, CanonicalizationError> {
    let payload = FingerprintPayload {
        x_mm: to_mm(sign.position.x),
        y_mm: to_mm(sign.position.y),
        nature: sign.nature,
        activity: sign.activity,
        vehicle_type: &sign.vehicle_type,
        vehicle_exception,
        time_windows: &sign.time_windows,
        date_range: &sign.date_range,
        boundary_role: sign.boundary_role,
        raw_segment_hint: &sign.raw_segment_hint,
        side_of_street: sign.side_of_street,
        max_stay_minutes: sign.max_stay_minutes,
        disabled_permit_exempt: sign.disabled_permit_exempt,
        point_regulation: sign.point_regulation,
    };
    Ok(fingerprint(&CanonicalBytes::new(&payload)?))
}

/// First-seen-wins duplicate filter.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    seen: HashMap<Fingerprint, SignId>,
}

impl DuplicateFilter {
    /// Empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sign. Returns the `DuplicateSign` exclusion if an earlier
    /// sign had the same fingerprint.
    pub fn check(&mut self, sign_id: &SignId, fp: Fingerprint) -> Option<Defect> {
        match self.seen.get(&fp) {
            Some(kept) => Some(
                Defect::exclusion(DefectKind::DuplicateSign, sign_id)
                    .with_sign(kept)
                    .detail(format!("same content as {kept} ({fp})")),
            ),
            None => {
                self.seen.insert(fp, sign_id.clone());
                None
            }
        }
    }
}
