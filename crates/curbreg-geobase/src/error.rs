//! Geobase and matching errors.

use thiserror::Error;

use curbreg_core::SegmentId;

/// The segment set cannot be indexed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeobaseError {
    /// Two segments share an id.
    #[error("duplicate segment id {0}")]
    DuplicateSegment(SegmentId),

    /// Grid cell size is zero, negative or not finite.
    #[error("grid cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
}

/// A position could not be assigned to a segment.
///
/// These are per-sign outcomes; the engine turns them into defects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// No segment lies within the search radius.
    #[error("no segment within {radius_m} m of ({x}, {y})")]
    Unmatched {
        /// Easting of the position.
        x: f64,
        /// Northing of the position.
        y: f64,
        /// Search radius used.
        radius_m: f64,
    },

    /// The nearest segment has zero-length geometry.
    #[error("segment {segment_id} has degenerate geometry (length {length} m)")]
    Degenerate {
        /// The segment.
        segment_id: SegmentId,
        /// Its length.
        length: f64,
    },

    /// A forced segment id is not in the geobase.
    #[error("segment {0} is not in the geobase")]
    UnknownSegment(SegmentId),
}
