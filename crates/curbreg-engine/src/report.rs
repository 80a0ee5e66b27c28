//! # Defect Report
//!
//! Every data-quality problem found during a run is a `Defect`: one entry
//! per condition, naming the signs involved, the signs excluded because of
//! it, and what the engine did about it. Defects never abort a run.
//!
//! Recording a defect also emits a `tracing` event at the defect's severity
//! and bumps the `curbreg_defects_total{kind}` counter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use curbreg_core::{BatchId, SegmentId, SignId};

/// Metric name for recorded defects.
pub const METRIC_DEFECTS: &str = "curbreg_defects_total";

/// Kind of defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefectKind {
    // Data quality.
    /// A window had exactly one of start/end.
    IncompleteTimeWindow,
    /// A date range had exactly one bound.
    IncompleteDateRange,
    /// A `00:00–00:00` window.
    VacuousTimeWindow,
    /// Overlapping windows disagree on the exception flag.
    InconsistentTemporalException,
    /// A missing value was filled with its default.
    InferredDefault,
    /// A residential-permit interdiction was forced vehicle-exempt.
    ForcedResidentialPermit,
    /// Nature is unknown; the sign cannot be consolidated.
    UnknownNature,
    /// Same content as an earlier sign.
    DuplicateSign,

    // Matching.
    /// No segment within the search radius.
    UnmatchedSign,
    /// Zero-length segment or zone.
    DegenerateSegmentMatch,
    /// The recorded segment was not geometrically plausible.
    SegmentHintOverridden,

    // Structure.
    /// `begin` while a zone was open.
    DuplicateZoneStart,
    /// `end` after the zone was closed.
    DuplicateZoneEnd,
    /// Zone still open at the end of the curb.
    UnterminatedZone,
    /// `end` with no zone opened.
    UnopenedZone,

    // Configuration.
    /// A configured override changed the sign.
    OverrideApplied,
    /// A configured override removed the sign.
    ExcludedByOverride,
}

impl DefectKind {
    /// Every kind, in declaration order.
    pub const ALL: [DefectKind; 17] = [
        Self::IncompleteTimeWindow,
        Self::IncompleteDateRange,
        Self::VacuousTimeWindow,
        Self::InconsistentTemporalException,
        Self::InferredDefault,
        Self::ForcedResidentialPermit,
        Self::UnknownNature,
        Self::DuplicateSign,
        Self::UnmatchedSign,
        Self::DegenerateSegmentMatch,
        Self::SegmentHintOverridden,
        Self::DuplicateZoneStart,
        Self::DuplicateZoneEnd,
        Self::UnterminatedZone,
        Self::UnopenedZone,
        Self::OverrideApplied,
        Self::ExcludedByOverride,
    ];

    /// Name as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncompleteTimeWindow => "IncompleteTimeWindow",
            Self::IncompleteDateRange => "IncompleteDateRange",
            Self::VacuousTimeWindow => "VacuousTimeWindow",
            Self::InconsistentTemporalException => "InconsistentTemporalException",
            Self::InferredDefault => "InferredDefault",
            Self::ForcedResidentialPermit => "ForcedResidentialPermit",
            Self::UnknownNature => "UnknownNature",
            Self::DuplicateSign => "DuplicateSign",
            Self::UnmatchedSign => "UnmatchedSign",
            Self::DegenerateSegmentMatch => "DegenerateSegmentMatch",
            Self::SegmentHintOverridden => "SegmentHintOverridden",
            Self::DuplicateZoneStart => "DuplicateZoneStart",
            Self::DuplicateZoneEnd => "DuplicateZoneEnd",
            Self::UnterminatedZone => "UnterminatedZone",
            Self::UnopenedZone => "UnopenedZone",
            Self::OverrideApplied => "OverrideApplied",
            Self::ExcludedByOverride => "ExcludedByOverride",
        }
    }

    /// Severity a defect of this kind is recorded with.
    pub fn severity(&self) -> Severity {
        match self {
            Self::InferredDefault
            | Self::ForcedResidentialPermit
            | Self::SegmentHintOverridden
            | Self::OverrideApplied => Severity::Info,
            Self::IncompleteTimeWindow
            | Self::IncompleteDateRange
            | Self::VacuousTimeWindow
            | Self::InconsistentTemporalException
            | Self::DuplicateSign
            | Self::ExcludedByOverride => Severity::Warning,
            Self::UnknownNature
            | Self::UnmatchedSign
            | Self::DegenerateSegmentMatch
            | Self::DuplicateZoneStart
            | Self::DuplicateZoneEnd
            | Self::UnterminatedZone
            | Self::UnopenedZone => Severity::Error,
        }
    }
}

impl std::fmt::Display for DefectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defect severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Traceability note; nothing was lost.
    Info,
    /// Data was repaired or dropped.
    Warning,
    /// A sign could not contribute to any zone.
    Error,
}

impl Severity {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine did about a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The offending field value was dropped; the sign continues.
    FieldDropped,
    /// A flag was overwritten by the configured policy.
    FlagOverwritten,
    /// A default was filled in.
    DefaultInferred,
    /// A value was forced by a domain rule.
    ValueForced,
    /// Geometry chose a segment other than the recorded one.
    GeometryPreferred,
    /// A configured override changed the sign.
    OverrideApplied,
    /// The listed signs were excluded from consolidation.
    SignExcluded,
}

/// One reported condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    /// Kind.
    pub kind: DefectKind,
    /// Severity.
    pub severity: Severity,
    /// Signs involved.
    pub sign_ids: Vec<SignId>,
    /// Signs excluded because of this defect (subset of `sign_ids`).
    #[serde(default)]
    pub excluded: Vec<SignId>,
    /// Segment concerned, when known.
    #[serde(default)]
    pub segment_id: Option<SegmentId>,
    /// Field concerned, when the defect is field-level.
    #[serde(default)]
    pub field: Option<String>,
    /// Action taken.
    pub resolution: Resolution,
    /// Free-text detail.
    #[serde(default)]
    pub detail: String,
}

impl Defect {
    /// A defect about one sign, with the kind's default severity.
    pub fn new(kind: DefectKind, sign_id: &SignId, resolution: Resolution) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            sign_ids: vec![sign_id.clone()],
            excluded: Vec::new(),
            segment_id: None,
            field: None,
            resolution,
            detail: String::new(),
        }
    }

    /// A defect that excludes `sign_id` from consolidation.
    pub fn exclusion(kind: DefectKind, sign_id: &SignId) -> Self {
        Self::new(kind, sign_id, Resolution::SignExcluded).excluding(sign_id)
    }

    /// Add an involved sign.
    pub fn with_sign(mut self, sign_id: &SignId) -> Self {
        if !self.sign_ids.contains(sign_id) {
            self.sign_ids.push(sign_id.clone());
        }
        self
    }

    /// Mark an involved sign as excluded.
    pub fn excluding(mut self, sign_id: &SignId) -> Self {
        self = self.with_sign(sign_id);
        if !self.excluded.contains(sign_id) {
            self.excluded.push(sign_id.clone());
        }
        self
    }

    /// Attach the segment.
    pub fn on_segment(mut self, segment_id: &SegmentId) -> Self {
        self.segment_id = Some(segment_id.clone());
        self
    }

    /// Attach the field name.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach detail text.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Per-run defect report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Run identifier.
    pub batch_id: BatchId,
    /// Defects in the order they were found.
    pub defects: Vec<Defect>,
}

impl Report {
    /// Empty report for a run.
    pub fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            defects: Vec::new(),
        }
    }

    /// Record one defect, logging it and counting it.
    pub fn record(&mut self, defect: Defect) {
        let kind = defect.kind.as_str();
        let signs = join_ids(&defect.sign_ids);
        let segment = defect
            .segment_id
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default();
        match defect.severity {
            Severity::Info => tracing::info!(
                kind,
                sign_ids = %signs,
                segment_id = %segment,
                detail = %defect.detail,
                "defect recorded"
            ),
            Severity::Warning => tracing::warn!(
                kind,
                sign_ids = %signs,
                segment_id = %segment,
                detail = %defect.detail,
                "defect recorded"
            ),
            Severity::Error => tracing::error!(
                kind,
                sign_ids = %signs,
                segment_id = %segment,
                detail = %defect.detail,
                "defect recorded"
            ),
        }
        metrics::counter!(METRIC_DEFECTS, "kind" => kind).increment(1);
        self.defects.push(defect);
    }

    /// Record several defects in order.
    pub fn extend(&mut self, defects: impl IntoIterator<Item = Defect>) {
        for d in defects {
            self.record(d);
        }
    }

    /// Defects of one kind.
    pub fn of_kind(&self, kind: DefectKind) -> impl Iterator<Item = &Defect> {
        self.defects.iter().filter(move |d| d.kind == kind)
    }

    /// Count per kind, only kinds that occurred.
    pub fn summary(&self) -> BTreeMap<DefectKind, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.defects {
            *counts.entry(d.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Every excluded sign id, in report order.
    pub fn excluded_sign_ids(&self) -> impl Iterator<Item = &SignId> {
        self.defects.iter().flat_map(|d| d.excluded.iter())
    }

    /// Number of defects at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.defects.iter().filter(|d| d.severity >= severity).count()
    }
}

fn join_ids(ids: &[SignId]) -> String {
    ids.iter()
        .map(SignId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
