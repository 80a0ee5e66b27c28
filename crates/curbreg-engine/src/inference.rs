//! # Exception Inference
//!
//! Resolves the tri-state `vehicle_exception` of a normalized sign to a
//! boolean. Pure and total: every sign gets an answer.
//!
//! | vehicle type        | nature        | recorded | result            |
//! |---------------------|---------------|----------|-------------------|
//! | residential permit  | interdiction  | any      | `true` (forced)   |
//! | residential permit  | permission    | yes/no   | as recorded       |
//! | anything            | anything      | absent   | `false` (default) |
//! | other               | any           | yes/no   | as recorded       |
//!
//! An interdiction scoped to permit holders only makes sense as "forbidden
//! except for permit holders", so the inventory's frequent omission of the
//! exception flag on those signs is repaired here.

use curbreg_core::{RegulationNature, Sign, TriState, VehicleType};

use crate::report::{Defect, DefectKind, Resolution};

/// Resolved exception plus the note explaining any inference.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Resolved value.
    pub vehicle_exception: bool,
    /// `ForcedResidentialPermit` or `InferredDefault` note, if any.
    pub note: Option<Defect>,
}

/// Resolve `vehicle_exception` for one sign.
pub fn infer_vehicle_exception(sign: &Sign) -> Inference {
    let permit = sign
        .vehicle_type
        .as_ref()
        .map_or(false, VehicleType::is_residential_permit);

    if permit && sign.nature == RegulationNature::Interdiction {
        let note = (sign.vehicle_exception != TriState::Yes).then(|| {
            Defect::new(
                DefectKind::ForcedResidentialPermit,
                &sign.id,
                Resolution::ValueForced,
            )
            .field("vehicle_exception")
            .detail(format!(
                "recorded {:?}, forced yes for residential-permit interdiction",
                sign.vehicle_exception
            ))
        });
        return Inference {
            vehicle_exception: true,
            note,
        };
    }

    match sign.vehicle_exception.as_bool() {
        Some(value) => Inference {
            vehicle_exception: value,
            note: None,
        },
        None => Inference {
            vehicle_exception: false,
            note: Some(
                Defect::new(DefectKind::InferredDefault, &sign.id, Resolution::DefaultInferred)
                    .field("vehicle_exception")
                    .detail("absent, defaulted to no"),
            ),
        },
    }
}
