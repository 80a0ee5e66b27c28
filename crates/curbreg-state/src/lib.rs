//! # curbreg-state — Zone Boundary State Machine
//!
//! The zone consolidator walks the marker signs of one curb group in
//! ascending curb order. This crate owns the state of that walk.
//!
//! ## State Machine
//!
//! - **Boundary scan** (`scan.rs`): `Closed → Open → Closed` driven by
//!   `begin` and `end` markers. Every rejected event is a typed
//!   [`ZoneScanError`] naming the sign ids involved; a rejected event never
//!   changes the state.
//!
//! ## Design
//!
//! The scan is a runtime state machine with an explicit `(state, event)`
//! match and an ordered transition log, like the lifecycle machines it
//! replaces. Marker ordering and grouping are the caller's job.

pub mod scan;

pub use scan::{
    BoundaryEvent, BoundaryState, ClosedZone, Marker, ScanTransitionRecord, ZoneScan,
    ZoneScanError,
};
