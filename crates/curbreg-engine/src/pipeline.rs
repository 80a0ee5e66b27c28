//! # Resolution Pipeline
//!
//! Runs one batch of signs against a geobase:
//!
//! ```text
//! overrides → normalize → inference → dedupe → match → consolidate → build
//! ```
//!
//! Per-sign stages run data-parallel on the rayon pool and are collected in
//! input order, so defects and zones come out the same on every run.
//! Consolidation needs whole curbs and runs after every match is in.
//!
//! Per-sign problems never abort the batch; they become defects. Only an
//! `EngineError` (duplicate input ids, a broken invariant in a built zone
//! or in the sign accounting) does, and then no zone is returned.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use curbreg_core::{
    BatchId, CanonicalizationError, Fingerprint, RegulationNature, RegulationZone, Segment,
    SegmentId, Sign, SignId,
};
use curbreg_geobase::{Geobase, HintOutcome, MatchError, SegmentMatcher};

use crate::builder::{build_zones, check_accounting};
use crate::config::EngineConfig;
use crate::consolidate::{Consolidator, MatchedSign};
use crate::dedupe::{sign_fingerprint, DuplicateFilter};
use crate::error::EngineError;
use crate::inference::infer_vehicle_exception;
use crate::normalize::normalize;
use crate::overrides::{apply_override, Overridden};
use crate::report::{Defect, DefectKind, Report, Resolution};

/// Metric name for signs entering a run.
pub const METRIC_SIGNS: &str = "curbreg_signs_total";
/// Metric name for zones produced by a run.
pub const METRIC_ZONES: &str = "curbreg_zones_total";

/// Result of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Validated zones, grouped by segment, side and regulation.
    pub zones: Vec<RegulationZone>,
    /// Every defect found, in pipeline order.
    pub report: Report,
}

/// A sign that survived the per-sign stages.
#[derive(Debug)]
struct Candidate {
    sign: Sign,
    vehicle_exception: bool,
    forced_segment: Option<SegmentId>,
    fingerprint: Fingerprint,
}

/// Outcome of the per-sign stages for one input sign.
#[derive(Debug)]
struct Prepared {
    defects: Vec<Defect>,
    candidate: Option<Candidate>,
}

/// Outcome of matching for one candidate.
type Placement = Result<(MatchedSign, Option<Defect>), Defect>;

/// The resolution engine: a geobase plus the configuration to run with.
#[derive(Debug)]
pub struct Engine {
    geobase: Geobase,
    config: EngineConfig,
}

impl Engine {
    /// Index `segments` and validate `config`.
    pub fn new(segments: Vec<Segment>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let geobase = Geobase::new(segments, config.grid_cell_m)?;
        tracing::debug!(
            segments = geobase.len(),
            cell_m = config.grid_cell_m,
            "geobase indexed"
        );
        Ok(Self { geobase, config })
    }

    /// Use an already indexed geobase.
    pub fn with_geobase(geobase: Geobase, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { geobase, config })
    }

    /// The segment reference set.
    pub fn geobase(&self) -> &Geobase {
        &self.geobase
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a batch of signs into regulation zones.
    ///
    /// # Errors
    ///
    /// `DuplicateSignId` when two input signs share an id, `Invariant` when
    /// a built zone or the final accounting breaks a model invariant,
    /// `Canonicalization` when a sign cannot be fingerprinted.
    pub fn run(&self, signs: Vec<Sign>) -> Result<EngineOutput, EngineError> {
        let batch_id = BatchId::new();
        let span = tracing::info_span!("engine_run", batch_id = %batch_id, signs = signs.len());
        let _guard = span.enter();

        let input_ids = unique_ids(&signs)?;
        metrics::counter!(METRIC_SIGNS).increment(signs.len() as u64);
        let mut report = Report::new(batch_id);

        // ─── Per-sign cleaning ──────────────────────────────────────────
        let prepared = signs
            .into_par_iter()
            .map(|sign| self.prepare(sign))
            .collect::<Result<Vec<_>, CanonicalizationError>>()?;

        let mut duplicates = DuplicateFilter::new();
        let mut candidates = Vec::with_capacity(prepared.len());
        for p in prepared {
            report.extend(p.defects);
            let Some(c) = p.candidate else { continue };
            match duplicates.check(&c.sign.id, c.fingerprint) {
                Some(dup) => report.record(dup),
                None => candidates.push(c),
            }
        }

        // ─── Matching ───────────────────────────────────────────────────
        let matcher = SegmentMatcher::new(&self.geobase, self.config.match_params());
        let placements: Vec<Placement> = candidates
            .into_par_iter()
            .map(|c| place(&matcher, c))
            .collect();

        let mut matched = Vec::with_capacity(placements.len());
        for p in placements {
            match p {
                Ok((m, note)) => {
                    if let Some(note) = note {
                        report.record(note);
                    }
                    matched.push(m);
                }
                Err(defect) => report.record(defect),
            }
        }

        // ─── Consolidation and assembly ─────────────────────────────────
        let epsilon = self.config.zero_length_epsilon_m;
        let consolidation =
            Consolidator::new(&self.geobase, self.config.standalone_extent, epsilon)
                .consolidate(matched);
        report.extend(consolidation.defects);

        let zones = build_zones(consolidation.drafts, &self.geobase, epsilon)?;
        check_accounting(&input_ids, &zones, &report)?;

        metrics::counter!(METRIC_ZONES).increment(zones.len() as u64);
        tracing::info!(
            zones = zones.len(),
            defects = report.defects.len(),
            excluded = report.excluded_sign_ids().count(),
            "batch resolved"
        );
        Ok(EngineOutput { zones, report })
    }

    /// Overrides, normalization, nature check, inference and fingerprint.
    fn prepare(&self, sign: Sign) -> Result<Prepared, CanonicalizationError> {
        let action = self.config.overrides.get(&sign.id);
        let (sign, forced_segment, mut defects) = match apply_override(sign, action) {
            Overridden::Excluded(defect) => return Ok(Prepared::dropped(vec![defect])),
            Overridden::Kept {
                sign,
                forced_segment,
                note,
            } => (sign, forced_segment, note.into_iter().collect::<Vec<_>>()),
        };

        let normalized = normalize(sign, self.config.temporal_exception_policy);
        defects.extend(normalized.defects);
        if normalized.rejected {
            return Ok(Prepared::dropped(defects));
        }
        let sign = normalized.sign;

        if sign.nature == RegulationNature::Unknown {
            defects.push(
                Defect::exclusion(DefectKind::UnknownNature, &sign.id)
                    .field("nature")
                    .detail("nature not classified; sign cannot form a zone"),
            );
            return Ok(Prepared::dropped(defects));
        }

        let inference = infer_vehicle_exception(&sign);
        defects.extend(inference.note);
        let fingerprint = sign_fingerprint(&sign, inference.vehicle_exception)?;

        Ok(Prepared {
            defects,
            candidate: Some(Candidate {
                sign,
                vehicle_exception: inference.vehicle_exception,
                forced_segment,
                fingerprint,
            }),
        })
    }
}

impl Prepared {
    fn dropped(defects: Vec<Defect>) -> Self {
        Self {
            defects,
            candidate: None,
        }
    }
}

fn unique_ids(signs: &[Sign]) -> Result<Vec<SignId>, EngineError> {
    let mut seen = HashSet::with_capacity(signs.len());
    for sign in signs {
        if !seen.insert(&sign.id) {
            return Err(EngineError::DuplicateSignId(sign.id.clone()));
        }
    }
    Ok(signs.iter().map(|s| s.id.clone()).collect())
}

fn place(matcher: &SegmentMatcher<'_>, c: Candidate) -> Placement {
    let sign = c.sign;
    let result = match &c.forced_segment {
        Some(segment_id) => matcher.project_onto(segment_id, sign.position, sign.side_of_street),
        None => matcher.match_position(
            sign.position,
            sign.side_of_street,
            sign.raw_segment_hint.as_ref(),
        ),
    };

    match result {
        Ok(placement) => {
            let note = match &placement.hint {
                HintOutcome::Overridden { hint } => Some(
                    Defect::new(
                        DefectKind::SegmentHintOverridden,
                        &sign.id,
                        Resolution::GeometryPreferred,
                    )
                    .on_segment(&placement.segment_id)
                    .field("raw_segment_hint")
                    .detail(format!(
                        "recorded {hint}, matched {} at {:.2} m",
                        placement.segment_id, placement.distance
                    )),
                ),
                _ => None,
            };
            Ok((
                MatchedSign {
                    sign,
                    vehicle_exception: c.vehicle_exception,
                    placement,
                },
                note,
            ))
        }
        Err(MatchError::Degenerate { segment_id, length }) => Err(Defect::exclusion(
            DefectKind::DegenerateSegmentMatch,
            &sign.id,
        )
        .on_segment(&segment_id)
        .detail(format!("segment length {length:.3} m"))),
        Err(e @ (MatchError::Unmatched { .. } | MatchError::UnknownSegment(_))) => {
            Err(Defect::exclusion(DefectKind::UnmatchedSign, &sign.id).detail(e.to_string()))
        }
    }
}
