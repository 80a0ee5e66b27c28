//! # Segment — Geobase Road Edge
//!
//! Immutable reference data. Segments are loaded once per run and shared
//! read-only by every worker.

use serde::{Deserialize, Serialize};

use crate::geometry::{Polyline, SideOfStreet};
use crate::identity::SegmentId;

/// Traffic direction relative to the digitization of a segment
/// (geobase `SENS_CIR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficDirection {
    /// One-way, traffic follows the digitized direction (`1`).
    Digitized,
    /// One-way, traffic runs against the digitized direction (`-1`).
    Reverse,
    /// Two-way (`0`).
    Both,
    /// Not recorded.
    #[default]
    Unset,
}

impl TrafficDirection {
    /// Map the geobase numeric code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Digitized,
            -1 => Self::Reverse,
            0 => Self::Both,
            _ => Self::Unset,
        }
    }

    /// Whether walking the curb on `side` in the direction of traffic goes
    /// from the last vertex toward the first.
    ///
    /// Boundary arrows are read in traffic order, so begin/end markers on
    /// such curbs must be scanned on mirrored offsets.
    pub fn runs_against_digitization(&self, side: SideOfStreet) -> bool {
        match self {
            Self::Reverse => true,
            Self::Both => side == SideOfStreet::Left,
            Self::Digitized | Self::Unset => false,
        }
    }
}

/// One geobase segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identifier (`ID_TRC`).
    pub id: SegmentId,
    /// Centreline geometry, projected metres.
    pub geometry: Polyline,
    /// Street name.
    #[serde(default)]
    pub street_name: String,
    /// Traffic direction.
    #[serde(default)]
    pub traffic_direction: TrafficDirection,
}

impl Segment {
    /// Length of the centreline in metres.
    pub fn length(&self) -> f64 {
        self.geometry.length()
    }
}
