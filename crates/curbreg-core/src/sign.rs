//! # Sign — One Physical Regulation Sign
//!
//! The engine's input record. A `Sign` is exactly what the inventory says,
//! including its contradictions: half-open time windows, missing exception
//! flags, wrong segment references. Nothing in this module repairs data;
//! that is the normalizer's job.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, SideOfStreet};
use crate::identity::{SegmentId, SignId};
use crate::temporal::{DateRange, DaySet, SeasonDay, TimeSpan, TriState};

/// Whether the sign allows or forbids the regulated activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationNature {
    /// The activity is allowed (possibly restricted to a class or a period).
    Permission,
    /// The activity is forbidden.
    Interdiction,
    /// Not classified in the source.
    #[default]
    Unknown,
}

impl RegulationNature {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Interdiction => "interdiction",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RegulationNature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The immobilization a sign regulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Parking (`stationnement`).
    #[default]
    Parking,
    /// Standing / stopping (`arrêt`).
    Standing,
}

/// Vehicle class a regulation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VehicleType {
    /// Residential parking permit (SRRR) holders of the listed sectors.
    ResidentialPermit {
        /// Permit sectors, as recorded.
        zones: Vec<String>,
    },
    /// Any other vehicle class (taxi, delivery, motorcycle, ...).
    Class {
        /// Class name, as recorded.
        name: String,
    },
}

impl VehicleType {
    /// Whether this is the residential-permit class.
    pub fn is_residential_permit(&self) -> bool {
        matches!(self, Self::ResidentialPermit { .. })
    }
}

/// Role of a sign along the curb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRole {
    /// Opens a zone (arrow pointing toward the street).
    Begin,
    /// Closes a zone (arrow pointing toward the sidewalk).
    End,
    /// Regulates the whole curb on its own.
    #[default]
    #[serde(rename = "none")]
    Standalone,
}

/// One time window as recorded, bounds possibly missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTimeWindow {
    /// Start time of day.
    pub start: Option<NaiveTime>,
    /// End time of day.
    pub end: Option<NaiveTime>,
    /// Days the window applies to (empty = every day).
    pub days: DaySet,
    /// Applies on school days only.
    pub school_days: bool,
    /// The window is an exception to the sign's default regulation.
    pub temporal_exception: TriState,
}

impl RawTimeWindow {
    /// A window with both bounds.
    pub fn spanning(span: TimeSpan, days: DaySet) -> Self {
        Self {
            start: Some(span.start),
            end: Some(span.end),
            days,
            ..Self::default()
        }
    }

    /// Both bounds, if both are present.
    pub fn span(&self) -> Option<TimeSpan> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(TimeSpan::new(start, end)),
            _ => None,
        }
    }

    /// Exactly one of start/end is present.
    pub fn is_half_open(&self) -> bool {
        self.start.is_some() != self.end.is_some()
    }
}

/// Seasonal bounds as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDateRange {
    /// First day.
    pub start: Option<SeasonDay>,
    /// Last day.
    pub end: Option<SeasonDay>,
}

impl RawDateRange {
    /// Both bounds, if both are present.
    pub fn complete(&self) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }

    /// Exactly one bound is present.
    pub fn is_half_open(&self) -> bool {
        self.start.is_some() != self.end.is_some()
    }
}

impl From<DateRange> for RawDateRange {
    fn from(r: DateRange) -> Self {
        Self {
            start: Some(r.start),
            end: Some(r.end),
        }
    }
}

/// One physical sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sign {
    /// Stable identifier.
    pub id: SignId,
    /// Location of the post, projected metres.
    pub position: Point,
    /// Permission / interdiction.
    #[serde(default)]
    pub nature: RegulationNature,
    /// Parking or standing.
    #[serde(default)]
    pub activity: Activity,
    /// Vehicle class scope.
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    /// The named class is exempt from the stated nature.
    #[serde(default)]
    pub vehicle_exception: TriState,
    /// Time windows in recorded order.
    #[serde(default)]
    pub time_windows: Vec<RawTimeWindow>,
    /// Seasonal applicability.
    #[serde(default)]
    pub date_range: Option<RawDateRange>,
    /// Begin / end marker or standalone.
    #[serde(default)]
    pub boundary_role: BoundaryRole,
    /// Segment recorded by the surveyor; may be wrong.
    #[serde(default)]
    pub raw_segment_hint: Option<SegmentId>,
    /// Side of street, when recorded.
    #[serde(default)]
    pub side_of_street: Option<SideOfStreet>,
    /// Maximum stay in minutes.
    #[serde(default)]
    pub max_stay_minutes: Option<u32>,
    /// Disabled-permit holders are exempt.
    #[serde(default)]
    pub disabled_permit_exempt: bool,
    /// The source designates a point regulation (zero-length zone allowed).
    #[serde(default)]
    pub point_regulation: bool,
}

impl Sign {
    /// A standalone sign with no attributes beyond id, position and nature.
    pub fn new(id: impl Into<String>, position: Point, nature: RegulationNature) -> Self {
        Self {
            id: SignId::new(id),
            position,
            nature,
            activity: Activity::default(),
            vehicle_type: None,
            vehicle_exception: TriState::Absent,
            time_windows: Vec::new(),
            date_range: None,
            boundary_role: BoundaryRole::Standalone,
            raw_segment_hint: None,
            side_of_street: None,
            max_stay_minutes: None,
            disabled_permit_exempt: false,
            point_regulation: false,
        }
    }

    /// Builder-style boundary role.
    pub fn with_role(mut self, role: BoundaryRole) -> Self {
        self.boundary_role = role;
        self
    }

    /// Builder-style segment hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.raw_segment_hint = Some(SegmentId::new(hint));
        self
    }

    /// Builder-style vehicle class.
    pub fn with_vehicle(mut self, vehicle_type: VehicleType, exception: TriState) -> Self {
        self.vehicle_type = Some(vehicle_type);
        self.vehicle_exception = exception;
        self
    }

    /// Builder-style time window.
    pub fn with_window(mut self, window: RawTimeWindow) -> Self {
        self.time_windows.push(window);
        self
    }
}
