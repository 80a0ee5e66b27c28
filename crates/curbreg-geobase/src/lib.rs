//! # curbreg-geobase — Reference Road Network and Segment Matching
//!
//! - **Geobase** (`geobase.rs`): the immutable segment set, indexed by id
//!   and by a uniform spatial grid. Built once per run and shared read-only.
//!
//! - **Grid** (`index.rs`): bucket index over segment bounding boxes.
//!
//! - **Matcher** (`matcher.rs`): assigns a sign position to the nearest
//!   segment within the search radius, honouring the surveyor's segment hint
//!   only among geometrically plausible candidates.

pub mod error;
pub mod geobase;
pub mod index;
pub mod matcher;

pub use error::{GeobaseError, MatchError};
pub use geobase::Geobase;
pub use index::SegmentGrid;
pub use matcher::{HintOutcome, MatchParams, SegmentMatch, SegmentMatcher};
