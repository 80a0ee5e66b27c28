//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared across the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Data-quality problems in the input are *not* errors: they become
//!   defects in the engine report and processing continues.
//! - `InvariantViolation` is reserved for states that indicate a logic
//!   defect upstream of the regulation builder. It is fatal for the batch.
//! - Geometry errors carry the offending coordinate or vertex count.

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum CurbError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Geometry could not be constructed.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A regulation zone failed invariant re-validation.
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// A value could not be parsed into a domain primitive.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Coordinates must be quantized to integers before hashing.
    #[error("float values are not permitted in canonical representations; quantize before hashing: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error constructing geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A polyline needs at least two vertices.
    #[error("polyline requires at least 2 vertices, got {0}")]
    TooFewVertices(usize),

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// Easting.
        x: f64,
        /// Northing.
        y: f64,
    },
}

/// A regulation zone or batch that breaks a model invariant after assembly.
///
/// Each variant names the zone's segment so the faulty upstream stage can
/// be located from the message alone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// A zone carries a `00:00:00–00:00:00` window.
    #[error("zone on segment {segment_id} carries a vacuous 00:00-00:00 time window")]
    VacuousTimeWindow {
        /// Segment of the zone.
        segment_id: String,
    },

    /// A window reached assembly with only one of start/end.
    #[error("sign {sign_id} reached assembly with a half-open time window")]
    PartialTimeWindow {
        /// Sign carrying the window.
        sign_id: String,
    },

    /// A date range reached assembly with only one bound.
    #[error("sign {sign_id} reached assembly with a half-open date range")]
    PartialDateRange {
        /// Sign carrying the range.
        sign_id: String,
    },

    /// A residential-permit interdiction was not exempted.
    #[error("zone on segment {segment_id} is a residential-permit interdiction without vehicle exception")]
    ResidentialPermitNotExempt {
        /// Segment of the zone.
        segment_id: String,
    },

    /// The zone nature was never resolved.
    #[error("zone on segment {segment_id} has unresolved regulation nature")]
    UnresolvedNature {
        /// Segment of the zone.
        segment_id: String,
    },

    /// The location range falls outside the segment.
    #[error("zone on segment {segment_id} spans [{start}, {end}] outside segment length {length}")]
    RangeOutOfBounds {
        /// Segment of the zone.
        segment_id: String,
        /// Range start offset.
        start: f64,
        /// Range end offset.
        end: f64,
        /// Segment length.
        length: f64,
    },

    /// The location range has start after end.
    #[error("zone on segment {segment_id} has inverted range [{start}, {end}]")]
    InvertedRange {
        /// Segment of the zone.
        segment_id: String,
        /// Range start offset.
        start: f64,
        /// Range end offset.
        end: f64,
    },

    /// A zero-length zone without point designation.
    #[error("zone on segment {segment_id} has zero length at offset {offset} without point designation")]
    ZeroLengthZone {
        /// Segment of the zone.
        segment_id: String,
        /// Collapsed offset.
        offset: f64,
    },

    /// A zone has no source signs.
    #[error("zone on segment {segment_id} has no source signs")]
    EmptyProvenance {
        /// Segment of the zone.
        segment_id: String,
    },

    /// A zone references a segment absent from the geobase.
    #[error("zone references unknown segment {segment_id}")]
    UnknownSegment {
        /// The unknown segment.
        segment_id: String,
    },

    /// A sign is cited by more than one zone or exclusion.
    #[error("sign {sign_id} is accounted for {count} times")]
    SignAccountedTwice {
        /// The sign.
        sign_id: String,
        /// Number of citations.
        count: usize,
    },

    /// A sign is cited neither by a zone nor by an exclusion defect.
    #[error("sign {sign_id} was dropped without a zone or a defect")]
    SignUnaccounted {
        /// The sign.
        sign_id: String,
    },
}
