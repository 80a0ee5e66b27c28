//! # Boundary Scan
//!
//! ## States
//!
//! ```text
//!            begin                 end
//! Closed ──────────▶ Open ──────────────▶ Closed   (emits a zone)
//!   │                 │
//!   │ end             │ begin
//!   ▼                 ▼
//! DuplicateEnd /    DuplicateStart
//! Unopened          (state unchanged)
//! (state unchanged)
//! ```
//!
//! At the end of a group, an `Open` scan is `Unterminated`.
//!
//! A repeated `begin` keeps the zone anchored on the first one. A stray `end`
//! is `DuplicateEnd` when an earlier `end` already closed a zone in the same
//! group, `Unopened` when no zone was ever opened.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use curbreg_core::SignId;

// ─── State ───────────────────────────────────────────────────────────

/// Whether a zone is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryState {
    /// No zone open.
    #[default]
    Closed,
    /// A `begin` marker is waiting for its `end`.
    Open,
}

impl BoundaryState {
    /// Events accepted from this state.
    pub fn valid_events(&self) -> &'static [BoundaryEvent] {
        match self {
            Self::Closed => &[BoundaryEvent::Begin],
            Self::Open => &[BoundaryEvent::End],
        }
    }
}

impl std::fmt::Display for BoundaryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
        };
        f.write_str(s)
    }
}

/// Marker kind fed to the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryEvent {
    /// Zone start marker.
    Begin,
    /// Zone end marker.
    End,
}

impl std::fmt::Display for BoundaryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Begin => "begin",
            Self::End => "end",
        };
        f.write_str(s)
    }
}

/// One marker sign at its scan offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// The sign.
    pub sign_id: SignId,
    /// Offset along the curb in scan order, metres.
    pub offset: f64,
}

impl Marker {
    /// Create a marker.
    pub fn new(sign_id: SignId, offset: f64) -> Self {
        Self { sign_id, offset }
    }
}

/// A `begin`/`end` pair that closed successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedZone {
    /// Opening marker.
    pub begin: Marker,
    /// Closing marker.
    pub end: Marker,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// A marker the scan cannot accept in its current state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoneScanError {
    /// `begin` while a zone is already open.
    #[error("zone opened by {open} is already open; repeated begin {repeated}")]
    DuplicateStart {
        /// The `begin` that opened the zone.
        open: SignId,
        /// The repeated `begin`.
        repeated: SignId,
    },

    /// `end` after the zone was already closed.
    #[error("zone already closed by {closed_by}; repeated end {repeated}")]
    DuplicateEnd {
        /// The `end` that closed the previous zone.
        closed_by: SignId,
        /// The repeated `end`.
        repeated: SignId,
    },

    /// `end` with no zone ever opened in the group.
    #[error("end marker {sign_id} has no preceding begin")]
    Unopened {
        /// The stray `end`.
        sign_id: SignId,
    },

    /// Group ended with a zone still open.
    #[error("zone opened by {sign_id} is never closed")]
    Unterminated {
        /// The dangling `begin`.
        sign_id: SignId,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of one accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanTransitionRecord {
    /// State before the transition.
    pub from_state: BoundaryState,
    /// State after the transition.
    pub to_state: BoundaryState,
    /// The event that caused it.
    pub event: BoundaryEvent,
    /// The marker sign.
    pub sign_id: SignId,
}

// ─── Scan ────────────────────────────────────────────────────────────

/// Scan state for one curb group.
///
/// The scan is `Open` exactly while it holds a `begin` marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneScan {
    open: Option<Marker>,
    last_closed_by: Option<SignId>,
    transitions: Vec<ScanTransitionRecord>,
}

impl ZoneScan {
    /// A fresh scan in `Closed`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> BoundaryState {
        if self.open.is_some() {
            BoundaryState::Open
        } else {
            BoundaryState::Closed
        }
    }

    /// The `begin` marker holding the zone open, if any.
    pub fn open_marker(&self) -> Option<&Marker> {
        self.open.as_ref()
    }

    /// Accepted transitions in order.
    pub fn transitions(&self) -> &[ScanTransitionRecord] {
        &self.transitions
    }

    /// Feed one marker. Returns the zone closed by an accepted `end`.
    pub fn apply(
        &mut self,
        event: BoundaryEvent,
        marker: Marker,
    ) -> Result<Option<ClosedZone>, ZoneScanError> {
        match (self.open.take(), event) {
            (None, BoundaryEvent::Begin) => {
                self.record(BoundaryState::Closed, BoundaryState::Open, event, &marker.sign_id);
                self.open = Some(marker);
                Ok(None)
            }
            (Some(open), BoundaryEvent::Begin) => {
                let err = ZoneScanError::DuplicateStart {
                    open: open.sign_id.clone(),
                    repeated: marker.sign_id,
                };
                self.open = Some(open);
                Err(err)
            }
            (Some(begin), BoundaryEvent::End) => {
                self.record(BoundaryState::Open, BoundaryState::Closed, event, &marker.sign_id);
                self.last_closed_by = Some(marker.sign_id.clone());
                Ok(Some(ClosedZone { begin, end: marker }))
            }
            (None, BoundaryEvent::End) => match &self.last_closed_by {
                Some(closed_by) => Err(ZoneScanError::DuplicateEnd {
                    closed_by: closed_by.clone(),
                    repeated: marker.sign_id,
                }),
                None => Err(ZoneScanError::Unopened {
                    sign_id: marker.sign_id,
                }),
            },
        }
    }

    /// Feed a `begin` marker.
    pub fn begin(&mut self, marker: Marker) -> Result<(), ZoneScanError> {
        self.apply(BoundaryEvent::Begin, marker).map(|_| ())
    }

    /// Feed an `end` marker.
    pub fn end(&mut self, marker: Marker) -> Result<ClosedZone, ZoneScanError> {
        let sign_id = marker.sign_id.clone();
        self.apply(BoundaryEvent::End, marker)?
            .ok_or(ZoneScanError::Unopened { sign_id })
    }

    /// End of group. An open zone is `Unterminated`.
    pub fn finish(self) -> Result<Vec<ScanTransitionRecord>, ZoneScanError> {
        match self.open {
            Some(begin) => Err(ZoneScanError::Unterminated {
                sign_id: begin.sign_id,
            }),
            None => Ok(self.transitions),
        }
    }

    fn record(
        &mut self,
        from: BoundaryState,
        to: BoundaryState,
        event: BoundaryEvent,
        sign_id: &SignId,
    ) {
        self.transitions.push(ScanTransitionRecord {
            from_state: from,
            to_state: to,
            event,
            sign_id: sign_id.clone(),
        });
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
