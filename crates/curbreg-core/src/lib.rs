//! # curbreg-core — Foundational Types for Curb Regulation Resolution
//!
//! This crate is the leaf of the workspace. It defines the data model that
//! every other crate exchanges: the physical `Sign` as recorded in the civic
//! inventory, the immutable geobase `Segment`, and the validated
//! `RegulationZone` handed to the external CurbLR serializer.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `SignId`, `SegmentId`, `BatchId`.
//!    A segment reference can never be passed where a sign id is expected.
//!
//! 2. **Both-or-neither temporal bounds are types.** A validated
//!    `TimeWindow` carries an `Option<TimeSpan>`, so a window with exactly one
//!    of start/end cannot be represented once it leaves the normalizer.
//!
//! 3. **Projected coordinates only.** `Point` is metres in a projected CRS.
//!    Offsets along a `Polyline` are metres from its first vertex.
//!
//! 4. **`CanonicalBytes` for fingerprints.** Duplicate detection hashes the
//!    canonical JSON of a sign, never an ad hoc byte layout.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `curbreg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod segment;
pub mod sign;
pub mod temporal;
pub mod zone;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{fingerprint, Fingerprint};
pub use error::{CanonicalizationError, CurbError, GeometryError, InvariantViolation};
pub use geometry::{BoundingBox, Point, Polyline, Projection, SideOfStreet};
pub use identity::{BatchId, SegmentId, SignId};
pub use segment::{Segment, TrafficDirection};
pub use sign::{
    Activity, BoundaryRole, RawDateRange, RawTimeWindow, RegulationNature, Sign, VehicleType,
};
pub use temporal::{DateRange, DaySet, SeasonDay, TimeSpan, TriState};
pub use zone::{LocationRange, RegulationZone, TimeWindow};
