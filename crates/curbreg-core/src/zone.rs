//! # Regulation Zone — Engine Output Unit
//!
//! A contiguous stretch of one curb subject to one coherent regulation,
//! with provenance back to the signs that produced it. Zones are built once
//! by the regulation builder and never mutated afterwards.
//!
//! ## Invariants
//!
//! [`RegulationZone::validate`] re-checks, against the segment length:
//!
//! - no vacuous `00:00–00:00` window,
//! - a residential-permit interdiction is vehicle-exempt,
//! - nature is resolved,
//! - `0 <= start <= end <= length` (within epsilon),
//! - non-zero length unless designated a point regulation,
//! - at least one source sign.
//!
//! Half-open windows and date ranges are unrepresentable here; the
//! conversion from raw windows rejects them.

use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::geometry::SideOfStreet;
use crate::identity::{SegmentId, SignId};
use crate::sign::{Activity, RawTimeWindow, RegulationNature, VehicleType};
use crate::temporal::{DateRange, DaySet, TimeSpan};

/// A validated time window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Time-of-day bounds; `None` means all day.
    pub span: Option<TimeSpan>,
    /// Applicable days (empty = every day).
    pub days: DaySet,
    /// School days only.
    pub school_days: bool,
    /// The window is an exception to the default regulation.
    pub exception: bool,
}

impl TimeWindow {
    /// Convert a normalized raw window. A half-open window at this point is
    /// an upstream defect.
    pub fn from_raw(sign_id: &SignId, raw: &RawTimeWindow) -> Result<Self, InvariantViolation> {
        if raw.is_half_open() {
            return Err(InvariantViolation::PartialTimeWindow {
                sign_id: sign_id.to_string(),
            });
        }
        Ok(Self {
            span: raw.span(),
            days: raw.days,
            school_days: raw.school_days,
            exception: raw.temporal_exception.is_yes(),
        })
    }
}

/// Offsets along a segment, in metres from its first vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRange {
    /// Start offset.
    pub start: f64,
    /// End offset.
    pub end: f64,
}

impl LocationRange {
    /// Create a range.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length in metres.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// One regulation zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationZone {
    /// Segment the zone lies on.
    pub segment_id: SegmentId,
    /// Curb side.
    pub side_of_street: SideOfStreet,
    /// Permission / interdiction.
    pub nature: RegulationNature,
    /// Parking or standing.
    pub activity: Activity,
    /// Vehicle class scope.
    pub vehicle_type: Option<VehicleType>,
    /// Resolved vehicle exception.
    pub vehicle_exception: bool,
    /// Validated windows.
    pub time_windows: Vec<TimeWindow>,
    /// Validated seasonal range.
    pub date_range: Option<DateRange>,
    /// Maximum stay in minutes.
    pub max_stay_minutes: Option<u32>,
    /// Disabled-permit holders are exempt.
    pub disabled_permit_exempt: bool,
    /// Zero-length zone designated by the source.
    pub point_regulation: bool,
    /// Offsets along the segment.
    pub location_range: LocationRange,
    /// Signs that produced the zone, in curb order.
    pub source_sign_ids: Vec<SignId>,
}

impl RegulationZone {
    /// Re-check every zone invariant against the segment length.
    pub fn validate(&self, segment_length: f64, epsilon: f64) -> Result<(), InvariantViolation> {
        let segment_id = self.segment_id.to_string();

        if self
            .time_windows
            .iter()
            .any(|w| w.span.map_or(false, |s| s.is_vacuous()))
        {
            return Err(InvariantViolation::VacuousTimeWindow { segment_id });
        }

        if self.nature == RegulationNature::Unknown {
            return Err(InvariantViolation::UnresolvedNature { segment_id });
        }

        let permit = self
            .vehicle_type
            .as_ref()
            .map_or(false, VehicleType::is_residential_permit);
        if permit && self.nature == RegulationNature::Interdiction && !self.vehicle_exception {
            return Err(InvariantViolation::ResidentialPermitNotExempt { segment_id });
        }

        let LocationRange { start, end } = self.location_range;
        if start > end {
            return Err(InvariantViolation::InvertedRange {
                segment_id,
                start,
                end,
            });
        }
        if start < -epsilon || end > segment_length + epsilon {
            return Err(InvariantViolation::RangeOutOfBounds {
                segment_id,
                start,
                end,
                length: segment_length,
            });
        }
        if self.location_range.length() < epsilon && !self.point_regulation {
            return Err(InvariantViolation::ZeroLengthZone {
                segment_id,
                offset: start,
            });
        }

        if self.source_sign_ids.is_empty() {
            return Err(InvariantViolation::EmptyProvenance { segment_id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn zone() -> RegulationZone {
        RegulationZone {
            segment_id: SegmentId::new("S1"),
            side_of_street: SideOfStreet::Right,
            nature: RegulationNature::Interdiction,
            activity: Activity::Parking,
            vehicle_type: None,
            vehicle_exception: false,
            time_windows: Vec::new(),
            date_range: None,
            max_stay_minutes: None,
            disabled_permit_exempt: false,
            point_regulation: false,
            location_range: LocationRange::new(10.0, 40.0),
            source_sign_ids: vec![SignId::new("a"), SignId::new("b")],
        }
    }

    #[test]
    fn valid_zone_passes() {
        assert!(zone().validate(100.0, 0.01).is_ok());
    }

    #[test]
    fn residential_permit_interdiction_requires_exception() {
        let mut z = zone();
        z.vehicle_type = Some(VehicleType::ResidentialPermit { zones: vec!["12".into()] });
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::ResidentialPermitNotExempt { .. })
        ));
        z.vehicle_exception = true;
        assert!(z.validate(100.0, 0.01).is_ok());
    }

    #[test]
    fn range_beyond_segment_rejected() {
        let mut z = zone();
        z.location_range = LocationRange::new(10.0, 120.0);
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut z = zone();
        z.location_range = LocationRange::new(40.0, 10.0);
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::InvertedRange { .. })
        ));
    }

    #[test]
    fn zero_length_only_for_point_regulation() {
        let mut z = zone();
        z.location_range = LocationRange::new(20.0, 20.0);
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::ZeroLengthZone { .. })
        ));
        z.point_regulation = true;
        assert!(z.validate(100.0, 0.01).is_ok());
    }

    #[test]
    fn vacuous_window_rejected() {
        let mut z = zone();
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        z.time_windows.push(TimeWindow {
            span: Some(TimeSpan::new(midnight, midnight)),
            days: DaySet::EMPTY,
            school_days: false,
            exception: false,
        });
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::VacuousTimeWindow { .. })
        ));
    }

    #[test]
    fn unknown_nature_rejected() {
        let mut z = zone();
        z.nature = RegulationNature::Unknown;
        assert!(z.validate(100.0, 0.01).is_err());
    }

    #[test]
    fn empty_provenance_rejected() {
        let mut z = zone();
        z.source_sign_ids.clear();
        assert!(matches!(
            z.validate(100.0, 0.01),
            Err(InvariantViolation::EmptyProvenance { .. })
        ));
    }

    #[test]
    fn half_open_raw_window_cannot_convert() {
        let raw = RawTimeWindow {
            end: NaiveTime::from_hms_opt(9, 0, 0),
            ..RawTimeWindow::default()
        };
        assert!(TimeWindow::from_raw(&SignId::new("x"), &raw).is_err());
    }
}
