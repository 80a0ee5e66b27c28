//! # Zone Consolidator
//!
//! Groups matched signs by curb and regulation signature, then turns each
//! group into zone drafts.
//!
//! ## Curb order
//!
//! Arrows on the panels point along traffic. On a segment digitized against
//! traffic, and on the left curb of a two-way segment, walking the curb in
//! traffic order means walking from the last vertex to the first. Offsets on
//! those curbs are mirrored (`length - offset`) for the scan and mapped back
//! to digitization offsets for the draft.
//!
//! ## Per group
//!
//! - Each standalone sign yields one draft: the whole curb, or the
//!   configured window around the sign. A point-regulation sign yields a
//!   zero-length draft at its offset.
//! - `begin`/`end` markers are sorted by scan offset, then by id, and fed
//!   to a [`ZoneScan`]. Markers within the zero-length epsilon of each other
//!   share a pole: while a zone is open its `end` goes first, otherwise the
//!   `begin` does, so two zones meeting at one pole both survive. Rejected
//!   markers become structural defects.
//! - A closed pair shorter than the zero-length epsilon, with neither sign
//!   designating a point regulation, is degenerate: both signs excluded.

use std::collections::{BTreeMap, HashSet};

use curbreg_core::{
    Activity, BoundaryRole, RawDateRange, RawTimeWindow, RegulationNature, SegmentId,
    SideOfStreet, Sign, SignId, VehicleType,
};
use curbreg_geobase::{Geobase, SegmentMatch};
use curbreg_state::{BoundaryEvent, BoundaryState, ClosedZone, Marker, ZoneScan, ZoneScanError};

use crate::config::StandaloneExtent;
use crate::report::{Defect, DefectKind, Resolution};

/// A sign ready for consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSign {
    /// Normalized sign.
    pub sign: Sign,
    /// Resolved vehicle exception.
    pub vehicle_exception: bool,
    /// Where it sits.
    pub placement: SegmentMatch,
}

/// Everything that must be equal for two signs to bound the same zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegulationSignature {
    /// Permission / interdiction.
    pub nature: RegulationNature,
    /// Parking or standing.
    pub activity: Activity,
    /// Vehicle class scope.
    pub vehicle_type: Option<VehicleType>,
    /// Resolved vehicle exception.
    pub vehicle_exception: bool,
    /// Normalized windows.
    pub time_windows: Vec<RawTimeWindow>,
    /// Normalized seasonal range.
    pub date_range: Option<RawDateRange>,
    /// Maximum stay.
    pub max_stay_minutes: Option<u32>,
    /// Disabled-permit exemption.
    pub disabled_permit_exempt: bool,
}

impl RegulationSignature {
    /// Signature of a matched sign.
    pub fn of(m: &MatchedSign) -> Self {
        Self {
            nature: m.sign.nature,
            activity: m.sign.activity,
            vehicle_type: m.sign.vehicle_type.clone(),
            vehicle_exception: m.vehicle_exception,
            time_windows: m.sign.time_windows.clone(),
            date_range: m.sign.date_range,
            max_stay_minutes: m.sign.max_stay_minutes,
            disabled_permit_exempt: m.sign.disabled_permit_exempt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CurbKey {
    segment_id: SegmentId,
    side: SideOfStreet,
    signature: RegulationSignature,
}

/// A zone before invariant validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDraft {
    /// Segment.
    pub segment_id: SegmentId,
    /// Curb side.
    pub side: SideOfStreet,
    /// Shared regulation.
    pub signature: RegulationSignature,
    /// Zero length is intended.
    pub point_regulation: bool,
    /// Start offset, digitization order.
    pub start: f64,
    /// End offset, digitization order.
    pub end: f64,
    /// Contributing signs in curb order.
    pub source_sign_ids: Vec<SignId>,
}

/// Drafts plus structural defects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidation {
    /// Zone drafts, grouped by curb.
    pub drafts: Vec<ZoneDraft>,
    /// Structural and degenerate-zone defects.
    pub defects: Vec<Defect>,
}

/// Curb-wise consolidation over a shared geobase.
#[derive(Debug, Clone, Copy)]
pub struct Consolidator<'a> {
    geobase: &'a Geobase,
    extent: StandaloneExtent,
    epsilon: f64,
}

impl<'a> Consolidator<'a> {
    /// Create a consolidator.
    pub fn new(geobase: &'a Geobase, extent: StandaloneExtent, epsilon: f64) -> Self {
        Self {
            geobase,
            extent,
            epsilon,
        }
    }

    /// Consolidate all matched signs of a batch.
    pub fn consolidate(&self, signs: Vec<MatchedSign>) -> Consolidation {
        let mut groups: BTreeMap<CurbKey, Vec<MatchedSign>> = BTreeMap::new();
        for m in signs {
            let key = CurbKey {
                segment_id: m.placement.segment_id.clone(),
                side: m.placement.side,
                signature: RegulationSignature::of(&m),
            };
            groups.entry(key).or_default().push(m);
        }

        let mut out = Consolidation::default();
        for (key, members) in groups {
            self.consolidate_curb(&key, &members, &mut out);
        }
        out
    }

    fn consolidate_curb(&self, key: &CurbKey, members: &[MatchedSign], out: &mut Consolidation) {
        let Some(first) = members.first() else {
            return;
        };
        let curb = Curb {
            length: first.placement.segment_length,
            mirrored: self
                .geobase
                .get(&key.segment_id)
                .map_or(false, |s| s.traffic_direction.runs_against_digitization(key.side)),
        };

        let mut markers: Vec<(f64, BoundaryEvent, &SignId)> = Vec::new();
        let mut point_markers: HashSet<&SignId> = HashSet::new();
        for m in members {
            let offset = curb.to_scan(m.placement.offset);
            let event = match m.sign.boundary_role {
                BoundaryRole::Standalone => {
                    self.standalone(key, m, &curb, out);
                    continue;
                }
                BoundaryRole::Begin => BoundaryEvent::Begin,
                BoundaryRole::End => BoundaryEvent::End,
            };
            if m.sign.point_regulation {
                point_markers.insert(&m.sign.id);
            }
            markers.push((offset, event, &m.sign.id));
        }
        markers.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.2.cmp(b.2)));

        let marker_count = markers.len();
        let mut scan = ZoneScan::new();
        let mut rest = markers.as_slice();
        while let Some(&(pole, _, _)) = rest.first() {
            let here = rest.iter().take_while(|m| m.0 - pole < self.epsilon).count();
            let (at_pole, tail) = rest.split_at(here);
            rest = tail;

            // Two zones meeting at one pole: close the open one first.
            let (begins, ends): (Vec<_>, Vec<_>) =
                at_pole.iter().partition(|m| m.1 == BoundaryEvent::Begin);
            let (mut begins, mut ends) = (begins.into_iter(), ends.into_iter());
            loop {
                let next = match scan.state() {
                    BoundaryState::Open => ends.next().or_else(|| begins.next()),
                    BoundaryState::Closed => begins.next().or_else(|| ends.next()),
                };
                let Some(&(offset, event, sign_id)) = next else {
                    break;
                };
                match scan.apply(event, Marker::new(sign_id.clone(), offset)) {
                    Ok(None) => {}
                    Ok(Some(closed)) => {
                        let point = point_markers.contains(&closed.begin.sign_id)
                            || point_markers.contains(&closed.end.sign_id);
                        self.pair(key, closed, point, &curb, out);
                    }
                    Err(e) => out.defects.push(scan_defect(e, &key.segment_id)),
                }
            }
        }
        match scan.finish() {
            Ok(transitions) => tracing::debug!(
                segment_id = %key.segment_id,
                side = %key.side,
                markers = marker_count,
                transitions = transitions.len(),
                "curb scanned"
            ),
            Err(e) => out.defects.push(scan_defect(e, &key.segment_id)),
        }
    }

    fn standalone(&self, key: &CurbKey, m: &MatchedSign, curb: &Curb, out: &mut Consolidation) {
        let s = curb.to_scan(m.placement.offset);
        let (a, b) = if m.sign.point_regulation {
            (s, s)
        } else {
            match self.extent {
                StandaloneExtent::FullSegment => (0.0, curb.length),
                StandaloneExtent::AroundSign { before_m, after_m } => {
                    ((s - before_m).max(0.0), (s + after_m).min(curb.length))
                }
            }
        };
        if b - a < self.epsilon && !m.sign.point_regulation {
            out.defects.push(
                Defect::exclusion(DefectKind::DegenerateSegmentMatch, &m.sign.id)
                    .on_segment(&key.segment_id)
                    .detail(format!("standalone extent collapses at offset {s:.3}")),
            );
            return;
        }
        let (start, end) = curb.to_digitized(a, b);
        out.drafts.push(ZoneDraft {
            segment_id: key.segment_id.clone(),
            side: key.side,
            signature: key.signature.clone(),
            point_regulation: m.sign.point_regulation,
            start,
            end,
            source_sign_ids: vec![m.sign.id.clone()],
        });
    }

    fn pair(
        &self,
        key: &CurbKey,
        closed: ClosedZone,
        point: bool,
        curb: &Curb,
        out: &mut Consolidation,
    ) {
        let ClosedZone { begin, end } = closed;
        if end.offset - begin.offset < self.epsilon && !point {
            out.defects.push(
                Defect::new(
                    DefectKind::DegenerateSegmentMatch,
                    &begin.sign_id,
                    Resolution::SignExcluded,
                )
                .excluding(&begin.sign_id)
                .excluding(&end.sign_id)
                .on_segment(&key.segment_id)
                .detail(format!(
                    "begin and end at the same offset {:.3}",
                    begin.offset
                )),
            );
            return;
        }
        let (start, stop) = curb.to_digitized(begin.offset, end.offset);
        out.drafts.push(ZoneDraft {
            segment_id: key.segment_id.clone(),
            side: key.side,
            signature: key.signature.clone(),
            point_regulation: point,
            start,
            end: stop,
            source_sign_ids: vec![begin.sign_id, end.sign_id],
        });
    }
}

struct Curb {
    length: f64,
    mirrored: bool,
}

impl Curb {
    fn to_scan(&self, offset: f64) -> f64 {
        if self.mirrored {
            self.length - offset
        } else {
            offset
        }
    }

    fn to_digitized(&self, a: f64, b: f64) -> (f64, f64) {
        if self.mirrored {
            (self.length - b, self.length - a)
        } else {
            (a, b)
        }
    }
}

fn scan_defect(err: ZoneScanError, segment_id: &SegmentId) -> Defect {
    let detail = err.to_string();
    let defect = match err {
        ZoneScanError::DuplicateStart { open, repeated } => {
            Defect::new(DefectKind::DuplicateZoneStart, &open, Resolution::SignExcluded)
                .excluding(&repeated)
        }
        ZoneScanError::DuplicateEnd {
            closed_by,
            repeated,
        } => Defect::new(DefectKind::DuplicateZoneEnd, &closed_by, Resolution::SignExcluded)
            .excluding(&repeated),
        ZoneScanError::Unopened { sign_id } => Defect::exclusion(DefectKind::UnopenedZone, &sign_id),
        ZoneScanError::Unterminated { sign_id } => {
            Defect::exclusion(DefectKind::UnterminatedZone, &sign_id)
        }
    };
    defect.on_segment(segment_id).detail(detail)
}
