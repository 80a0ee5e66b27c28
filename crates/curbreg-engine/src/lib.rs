//! # curbreg-engine — Sign-to-Regulation Resolution
//!
//! Turns a batch of physical signs into validated regulation zones plus a
//! defect report.
//!
//! - **Overrides** (`overrides.rs`): per-sign corrections from configuration,
//!   applied first.
//!
//! - **Normalizer** (`normalize.rs`): drops half-open and vacuous time
//!   windows, half-open date ranges, and settles inconsistent temporal
//!   exception flags under the configured policy.
//!
//! - **Inference** (`inference.rs`): resolves the tri-state vehicle
//!   exception to a boolean.
//!
//! - **Duplicates** (`dedupe.rs`): content fingerprints over canonical JSON;
//!   the first sign of a fingerprint wins.
//!
//! - **Consolidator** (`consolidate.rs`): groups matched signs per curb and
//!   regulation and scans begin/end markers with the zone state machine
//!   from `curbreg-state`.
//!
//! - **Builder** (`builder.rs`): converts drafts into `RegulationZone`,
//!   re-checks every invariant and the sign accounting.
//!
//! - **Pipeline** (`pipeline.rs`): `Engine::run`, wiring the stages above
//!   over the rayon pool.
//!
//! ## Crate Policy
//!
//! - Per-sign problems are `Defect`s in the `Report`, never errors.
//! - `EngineError` aborts the batch; no partial zone list is returned.
//! - Defects are logged through `tracing` at their severity and counted
//!   through `metrics`.

pub mod builder;
pub mod config;
pub mod consolidate;
pub mod dedupe;
pub mod error;
pub mod inference;
pub mod normalize;
pub mod overrides;
pub mod pipeline;
pub mod report;

pub use config::{
    ConfigError, EngineConfig, OverrideAction, StandaloneExtent, TemporalExceptionPolicy,
};
pub use consolidate::{Consolidation, Consolidator, MatchedSign, ZoneDraft};
pub use error::EngineError;
pub use inference::{infer_vehicle_exception, Inference};
pub use normalize::{normalize, Normalization};
pub use pipeline::{Engine, EngineOutput};
pub use report::{Defect, DefectKind, Report, Resolution, Severity};
