//! # Per-Sign Overrides
//!
//! Known-bad inventory records are corrected from configuration instead of
//! code. Overrides run before normalization, so a corrected sign flows
//! through the same checks as any other.

use curbreg_core::{SegmentId, Sign};

use crate::config::OverrideAction;
use crate::report::{Defect, DefectKind, Resolution};

/// Result of applying the override for one sign.
#[derive(Debug, Clone, PartialEq)]
pub enum Overridden {
    /// The sign continues, possibly corrected.
    Kept {
        /// The sign after the override.
        sign: Sign,
        /// Segment to match to, bypassing geometry.
        forced_segment: Option<SegmentId>,
        /// `OverrideApplied` note, if an override ran.
        note: Option<Defect>,
    },
    /// The sign is removed from the batch.
    Excluded(Defect),
}

/// Apply `action` (if any) to `sign`.
pub fn apply_override(mut sign: Sign, action: Option<&OverrideAction>) -> Overridden {
    let Some(action) = action else {
        return Overridden::Kept {
            sign,
            forced_segment: None,
            note: None,
        };
    };

    let mut forced_segment = None;
    let (field, detail) = match action {
        OverrideAction::Exclude { reason } => {
            return Overridden::Excluded(
                Defect::exclusion(DefectKind::ExcludedByOverride, &sign.id).detail(reason.clone()),
            );
        }
        OverrideAction::SetSegment { segment_id } => {
            forced_segment = Some(segment_id.clone());
            ("segment", format!("segment forced to {segment_id}"))
        }
        OverrideAction::SetBoundaryRole { role } => {
            sign.boundary_role = *role;
            ("boundary_role", format!("boundary role set to {role:?}"))
        }
        OverrideAction::SetVehicleException { value } => {
            sign.vehicle_exception = *value;
            ("vehicle_exception", format!("vehicle exception set to {value:?}"))
        }
        OverrideAction::SetNature { nature } => {
            sign.nature = *nature;
            ("nature", format!("nature set to {nature}"))
        }
    };

    let mut note = Defect::new(DefectKind::OverrideApplied, &sign.id, Resolution::OverrideApplied)
        .field(field)
        .detail(detail);
    if let Some(seg) = &forced_segment {
        note = note.on_segment(seg);
    }
    Overridden::Kept {
        sign,
        forced_segment,
        note: Some(note),
    }
}
