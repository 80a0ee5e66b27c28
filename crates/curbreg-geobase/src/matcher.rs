//! # Segment Matcher
//!
//! Assigns a sign to a geobase segment.
//!
//! ## Rules
//!
//! 1. Candidates are segments whose perpendicular distance to the sign is
//!    within `search_radius_m`.
//! 2. A candidate is *plausible* when its distance is within
//!    `hint_tolerance_m` of the best distance.
//! 3. The recorded segment hint wins only if it is plausible. Otherwise the
//!    nearest candidate wins, ties broken by the lexicographically smallest
//!    segment id.
//! 4. A winner shorter than `zero_length_epsilon_m` is degenerate: the sign
//!    cannot be linearly referenced on it.
//!
//! Side of street comes from the sign when recorded, otherwise from the
//! projection onto the matched piece.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use curbreg_core::{Point, Projection, Segment, SegmentId, SideOfStreet};

use crate::error::MatchError;
use crate::geobase::Geobase;

/// Matching thresholds, metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchParams {
    /// Maximum perpendicular distance to a candidate.
    pub search_radius_m: f64,
    /// Slack over the best distance within which the hint is honoured.
    pub hint_tolerance_m: f64,
    /// Below this length a segment is degenerate.
    pub zero_length_epsilon_m: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            search_radius_m: 20.0,
            hint_tolerance_m: 1.0,
            zero_length_epsilon_m: 0.01,
        }
    }
}

/// What happened to the recorded segment hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HintOutcome {
    /// No hint recorded.
    Absent,
    /// The hint named the matched segment.
    Honoured,
    /// The hint was not plausible and geometry chose another segment.
    Overridden {
        /// The recorded hint.
        hint: SegmentId,
    },
    /// The segment was forced by an override; geometry was not consulted.
    Forced,
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMatch {
    /// Matched segment.
    pub segment_id: SegmentId,
    /// Offset of the projection along the segment, digitization order.
    pub offset: f64,
    /// Perpendicular distance from the sign to the segment.
    pub distance: f64,
    /// Curb side.
    pub side: SideOfStreet,
    /// Length of the matched segment.
    pub segment_length: f64,
    /// Fate of the hint.
    pub hint: HintOutcome,
}

/// Matches positions against a shared geobase.
#[derive(Debug, Clone, Copy)]
pub struct SegmentMatcher<'a> {
    geobase: &'a Geobase,
    params: MatchParams,
}

impl<'a> SegmentMatcher<'a> {
    /// Create a matcher.
    pub fn new(geobase: &'a Geobase, params: MatchParams) -> Self {
        Self { geobase, params }
    }

    /// Thresholds in use.
    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    /// Match a sign position.
    ///
    /// # Errors
    ///
    /// `Unmatched` when no segment is within the radius, `Degenerate` when
    /// the winner has zero length.
    pub fn match_position(
        &self,
        position: Point,
        side: Option<SideOfStreet>,
        hint: Option<&SegmentId>,
    ) -> Result<SegmentMatch, MatchError> {
        let radius = self.params.search_radius_m;
        let unmatched = || MatchError::Unmatched {
            x: position.x,
            y: position.y,
            radius_m: radius,
        };
        if !position.is_finite() {
            return Err(unmatched());
        }

        let candidates: Vec<(&Segment, Projection)> = self
            .geobase
            .candidates(position, radius)
            .map(|seg| (seg, seg.geometry.project(position)))
            .filter(|(_, proj)| proj.distance <= radius)
            .collect();

        let nearest = candidates
            .iter()
            .min_by(|a, b| by_distance_then_id(a, b))
            .ok_or_else(unmatched)?;
        let best_distance = nearest.1.distance;

        let hinted = hint.and_then(|h| {
            candidates.iter().find(|(seg, proj)| {
                &seg.id == h && proj.distance <= best_distance + self.params.hint_tolerance_m
            })
        });

        let ((segment, projection), outcome) = match (hint, hinted) {
            (_, Some(chosen)) => (chosen, HintOutcome::Honoured),
            (Some(h), None) => {
                tracing::debug!(
                    hint = %h,
                    segment_id = %nearest.0.id,
                    distance = nearest.1.distance,
                    "segment hint not plausible, using nearest segment"
                );
                (nearest, HintOutcome::Overridden { hint: h.clone() })
            }
            (None, None) => (nearest, HintOutcome::Absent),
        };

        self.accept(segment, projection, side, outcome)
    }

    /// Project a sign onto a segment chosen by the caller.
    ///
    /// # Errors
    ///
    /// `UnknownSegment` when the id is absent, `Degenerate` for zero length.
    pub fn project_onto(
        &self,
        segment_id: &SegmentId,
        position: Point,
        side: Option<SideOfStreet>,
    ) -> Result<SegmentMatch, MatchError> {
        let segment = self
            .geobase
            .get(segment_id)
            .ok_or_else(|| MatchError::UnknownSegment(segment_id.clone()))?;
        let projection = segment.geometry.project(position);
        self.accept(segment, &projection, side, HintOutcome::Forced)
    }

    fn accept(
        &self,
        segment: &Segment,
        projection: &Projection,
        side: Option<SideOfStreet>,
        hint: HintOutcome,
    ) -> Result<SegmentMatch, MatchError> {
        let length = segment.length();
        if length < self.params.zero_length_epsilon_m {
            return Err(MatchError::Degenerate {
                segment_id: segment.id.clone(),
                length,
            });
        }
        Ok(SegmentMatch {
            segment_id: segment.id.clone(),
            offset: projection.offset.clamp(0.0, length),
            distance: projection.distance,
            side: side.unwrap_or(projection.side),
            segment_length: length,
            hint,
        })
    }
}

fn by_distance_then_id(a: &(&Segment, Projection), b: &(&Segment, Projection)) -> Ordering {
    a.1.distance
        .total_cmp(&b.1.distance)
        .then_with(|| a.0.id.cmp(&b.0.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curbreg_core::{Polyline, TrafficDirection};
    use proptest::prelude::*;

    fn seg(id: &str, coords: &[(f64, f64)]) -> Segment {
        Segment {
            id: SegmentId::new(id),
            geometry: Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
                .unwrap(),
            street_name: String::new(),
            traffic_direction: TrafficDirection::Unset,
        }
    }

    fn geobase() -> Geobase {
        Geobase::new(
            vec![
                seg("S1", &[(0.0, 0.0), (100.0, 0.0)]),
                seg("S2", &[(0.0, 30.0), (100.0, 30.0)]),
                seg("S3", &[(0.0, -10.0), (100.0, -10.0)]),
                seg("Z", &[(500.0, 500.0), (500.0, 500.0)]),
            ],
            50.0,
        )
        .unwrap()
    }

    #[test]
    fn nearest_segment_wins() {
        let gb = geobase();
        let m = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(40.0, 2.0), None, None)
            .unwrap();
        assert_eq!(m.segment_id.as_str(), "S1");
        assert!((m.offset - 40.0).abs() < 1e-9);
        assert_eq!(m.side, SideOfStreet::Left);
        assert_eq!(m.hint, HintOutcome::Absent);
    }

    #[test]
    fn implausible_hint_is_overridden() {
        let gb = geobase();
        let m = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(40.0, 2.0), None, Some(&SegmentId::new("S3")))
            .unwrap();
        assert_eq!(m.segment_id.as_str(), "S1");
        assert_eq!(
            m.hint,
            HintOutcome::Overridden {
                hint: SegmentId::new("S3")
            }
        );
    }

    #[test]
    fn plausible_hint_is_honoured() {
        let gb = geobase();
        // 5.0 m from S1 and from S3.
        let m = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(40.0, -5.0), None, Some(&SegmentId::new("S3")))
            .unwrap();
        assert_eq!(m.segment_id.as_str(), "S3");
        assert_eq!(m.hint, HintOutcome::Honoured);
    }

    #[test]
    fn exact_tie_breaks_on_smallest_id() {
        let gb = geobase();
        let m = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(40.0, -5.0), None, None)
            .unwrap();
        assert_eq!(m.segment_id.as_str(), "S1");
    }

    #[test]
    fn nothing_in_radius_is_unmatched() {
        let gb = geobase();
        let err = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(300.0, 300.0), None, None)
            .unwrap_err();
        assert!(matches!(err, MatchError::Unmatched { .. }));
    }

    #[test]
    fn zero_length_segment_is_degenerate() {
        let gb = geobase();
        let err = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(503.0, 500.0), None, None)
            .unwrap_err();
        assert!(matches!(err, MatchError::Degenerate { .. }));
    }

    #[test]
    fn recorded_side_takes_precedence() {
        let gb = geobase();
        let m = SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(40.0, 2.0), Some(SideOfStreet::Right), None)
            .unwrap();
        assert_eq!(m.side, SideOfStreet::Right);
    }

    #[test]
    fn forced_projection() {
        let gb = geobase();
        let matcher = SegmentMatcher::new(&gb, MatchParams::default());
        let m = matcher
            .project_onto(&SegmentId::new("S2"), Point::new(10.0, 2.0), None)
            .unwrap();
        assert_eq!(m.segment_id.as_str(), "S2");
        assert_eq!(m.hint, HintOutcome::Forced);
        assert_eq!(m.side, SideOfStreet::Right);
        assert!(matches!(
            matcher.project_onto(&SegmentId::new("nope"), Point::new(0.0, 0.0), None),
            Err(MatchError::UnknownSegment(_))
        ));
    }

    #[test]
    fn non_finite_position_is_unmatched() {
        let gb = geobase();
        assert!(SegmentMatcher::new(&gb, MatchParams::default())
            .match_position(Point::new(f64::NAN, 0.0), None, None)
            .is_err());
    }

    fn hint() -> impl Strategy<Value = Option<SegmentId>> {
        prop::option::of(prop_oneof![Just("S1"), Just("S2"), Just("S3")].prop_map(SegmentId::new))
    }

    proptest! {
        #[test]
        fn match_agrees_with_brute_force(
            x in -40.0f64..140.0,
            y in -50.0f64..70.0,
            hint in hint(),
        ) {
            let gb = geobase();
            let params = MatchParams::default();
            let p = Point::new(x, y);
            let live = ["S1", "S2", "S3"].map(|id| gb.get(&SegmentId::new(id)).unwrap());
            let best = live
                .iter()
                .map(|s| s.geometry.project(p).distance)
                .fold(f64::INFINITY, f64::min);

            match SegmentMatcher::new(&gb, params).match_position(p, None, hint.as_ref()) {
                Ok(m) => {
                    prop_assert!(best <= params.search_radius_m);
                    prop_assert!(m.distance <= params.search_radius_m);
                    prop_assert!(m.distance <= best + params.hint_tolerance_m + 1e-9);
                    match m.hint {
                        HintOutcome::Honoured => prop_assert_eq!(Some(&m.segment_id), hint.as_ref()),
                        _ => prop_assert!((m.distance - best).abs() < 1e-9),
                    }
                }
                Err(e) => {
                    prop_assert!(matches!(e, MatchError::Unmatched { .. }), "expected Unmatched, got {:?}", e);
                    prop_assert!(best > params.search_radius_m);
                }
            }
        }
    }
}
