//! # Batch Properties
//!
//! Random batches on a small geobase. Whatever the inventory looks like, a
//! run completes, every sign ends up in exactly one zone or one exclusion,
//! the emitted zones respect the structural rules, and every boundary
//! marker is either paired or blamed by exactly one defect.

use std::collections::HashMap;

use proptest::prelude::*;

use curbreg_core::{
    BoundaryRole, Point, Polyline, RegulationNature, Segment, SegmentId, Sign, SignId,
    TrafficDirection, TriState, VehicleType,
};
use curbreg_engine::{DefectKind, Engine, EngineConfig};

fn geobase() -> Vec<Segment> {
    let seg = |id: &str, from: Point, to: Point, dir| Segment {
        id: SegmentId::new(id),
        geometry: Polyline::new(vec![from, to]).unwrap(),
        street_name: String::new(),
        traffic_direction: dir,
    };
    vec![
        seg("S1", Point::new(0.0, 0.0), Point::new(100.0, 0.0), TrafficDirection::Both),
        seg("S2", Point::new(0.0, 30.0), Point::new(100.0, 30.0), TrafficDirection::Reverse),
    ]
}

fn nature() -> impl Strategy<Value = RegulationNature> {
    prop_oneof![
        4 => Just(RegulationNature::Interdiction),
        4 => Just(RegulationNature::Permission),
        1 => Just(RegulationNature::Unknown),
    ]
}

fn role() -> impl Strategy<Value = BoundaryRole> {
    prop_oneof![
        Just(BoundaryRole::Begin),
        Just(BoundaryRole::End),
        Just(BoundaryRole::Standalone),
    ]
}

fn vehicle() -> impl Strategy<Value = Option<VehicleType>> {
    prop_oneof![
        Just(None),
        Just(Some(VehicleType::Class {
            name: "taxi".into()
        })),
        Just(Some(VehicleType::ResidentialPermit {
            zones: vec!["108".into()]
        })),
    ]
}

fn tri() -> impl Strategy<Value = TriState> {
    prop_oneof![Just(TriState::Yes), Just(TriState::No), Just(TriState::Absent)]
}

/// Signs along both streets, some out of reach, with optional stale hints.
fn batch() -> impl Strategy<Value = Vec<Sign>> {
    prop::collection::vec(
        (
            0.0f64..100.0,
            -25.0f64..60.0,
            nature(),
            role(),
            vehicle(),
            tri(),
            prop::option::of(prop_oneof![Just("S1"), Just("S2"), Just("S9")]),
        ),
        0..24,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (x, y, nature, role, vehicle, exception, hint))| {
                let mut sign = Sign::new(format!("p{i}"), Point::new(x, y), nature).with_role(role);
                sign.vehicle_type = vehicle;
                sign.vehicle_exception = exception;
                sign.raw_segment_hint = hint.map(SegmentId::new);
                sign
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_sign_is_accounted_for_once(signs in batch()) {
        let input: Vec<SignId> = signs.iter().map(|s| s.id.clone()).collect();
        let out = Engine::new(geobase(), EngineConfig::default())
            .unwrap()
            .run(signs)
            .unwrap();

        let mut seen: HashMap<SignId, usize> = HashMap::new();
        for id in out
            .zones
            .iter()
            .flat_map(|z| z.source_sign_ids.iter())
            .chain(out.report.defects.iter().flat_map(|d| d.excluded.iter()))
        {
            *seen.entry(id.clone()).or_insert(0) += 1;
        }
        for id in &input {
            prop_assert_eq!(seen.get(id).copied(), Some(1), "sign {}", id);
        }
        prop_assert_eq!(seen.len(), input.len());
    }

    #[test]
    fn zones_respect_structure(signs in batch()) {
        let by_id: HashMap<SignId, Sign> =
            signs.iter().map(|s| (s.id.clone(), s.clone())).collect();
        let segments: HashMap<SegmentId, f64> =
            geobase().into_iter().map(|s| (s.id.clone(), s.length())).collect();
        let out = Engine::new(geobase(), EngineConfig::default())
            .unwrap()
            .run(signs)
            .unwrap();

        for zone in &out.zones {
            let length = segments[&zone.segment_id];
            prop_assert!(zone.location_range.start >= -1e-9);
            prop_assert!(zone.location_range.start <= zone.location_range.end);
            prop_assert!(zone.location_range.end <= length + 1e-9);
            prop_assert_ne!(zone.nature, RegulationNature::Unknown);

            let sources: Vec<&Sign> =
                zone.source_sign_ids.iter().map(|id| &by_id[id]).collect();
            match sources.as_slice() {
                [single] => prop_assert_eq!(single.boundary_role, BoundaryRole::Standalone),
                [begin, end] => {
                    prop_assert_eq!(begin.boundary_role, BoundaryRole::Begin);
                    prop_assert_eq!(end.boundary_role, BoundaryRole::End);
                    prop_assert_eq!(begin.nature, end.nature);
                }
                other => prop_assert!(false, "zone with {} sources", other.len()),
            }

            let permit_interdiction = zone.nature == RegulationNature::Interdiction
                && zone
                    .vehicle_type
                    .as_ref()
                    .is_some_and(VehicleType::is_residential_permit);
            if permit_interdiction {
                prop_assert!(zone.vehicle_exception);
            }
        }

        for defect in out.report.of_kind(DefectKind::UnknownNature) {
            prop_assert_eq!(&defect.excluded, &defect.sign_ids);
        }
    }

    #[test]
    fn boundary_markers_balance(signs in batch()) {
        let roles: HashMap<SignId, BoundaryRole> =
            signs.iter().map(|s| (s.id.clone(), s.boundary_role)).collect();
        let count_role = |role: BoundaryRole| roles.values().filter(|r| **r == role).count();
        let (begins, ends) = (count_role(BoundaryRole::Begin), count_role(BoundaryRole::End));
        let out = Engine::new(geobase(), EngineConfig::default())
            .unwrap()
            .run(signs)
            .unwrap();

        let paired = out.zones.iter().filter(|z| z.source_sign_ids.len() == 2).count();
        let structural = |kind: DefectKind, role: BoundaryRole| -> Result<usize, TestCaseError> {
            let mut n = 0;
            for defect in out.report.of_kind(kind) {
                prop_assert_eq!(defect.excluded.len(), 1, "{:?}", defect);
                prop_assert_eq!(roles[&defect.excluded[0]], role, "{:?}", defect);
                n += 1;
            }
            Ok(n)
        };
        let repeated_begins = structural(DefectKind::DuplicateZoneStart, BoundaryRole::Begin)?;
        let unterminated = structural(DefectKind::UnterminatedZone, BoundaryRole::Begin)?;
        let repeated_ends = structural(DefectKind::DuplicateZoneEnd, BoundaryRole::End)?;
        let unopened = structural(DefectKind::UnopenedZone, BoundaryRole::End)?;

        let is_structural = |kind: DefectKind| {
            matches!(
                kind,
                DefectKind::DuplicateZoneStart
                    | DefectKind::UnterminatedZone
                    | DefectKind::DuplicateZoneEnd
                    | DefectKind::UnopenedZone
            )
        };
        let dropped_early = |role: BoundaryRole| {
            out.report
                .defects
                .iter()
                .filter(|d| !is_structural(d.kind))
                .flat_map(|d| d.excluded.iter())
                .filter(|id| roles[*id] == role)
                .count()
        };

        prop_assert_eq!(
            begins,
            paired + repeated_begins + unterminated + dropped_early(BoundaryRole::Begin)
        );
        prop_assert_eq!(
            ends,
            paired + repeated_ends + unopened + dropped_early(BoundaryRole::End)
        );
    }
}
