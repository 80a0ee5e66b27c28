//! Engine errors.
//!
//! Only conditions that abort the whole batch live here. Everything that
//! concerns a single sign is a `Defect` in the report.

use thiserror::Error;

use curbreg_core::{CanonicalizationError, InvariantViolation, SignId};
use curbreg_geobase::GeobaseError;

use crate::config::ConfigError;

/// Fatal engine error. The batch produces no zones.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A built zone or the batch accounting broke a model invariant.
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The segment set could not be indexed.
    #[error("geobase error: {0}")]
    Geobase(#[from] GeobaseError),

    /// A sign fingerprint could not be computed.
    #[error("fingerprint error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Two input signs share an id; provenance would be ambiguous.
    #[error("duplicate sign id in input: {0}")]
    DuplicateSignId(SignId),
}
