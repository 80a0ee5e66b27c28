//! # Boundary State Machine Transition Matrix
//!
//! Every (state, event) pair of the zone boundary scan, plus the end-of-group
//! check. Accepted pairs must move the state and leave a transition record;
//! rejected pairs must leave the state untouched.

use curbreg_core::SignId;
use curbreg_state::{BoundaryEvent, BoundaryState, Marker, ZoneScan, ZoneScanError};

fn m(id: &str, offset: f64) -> Marker {
    Marker::new(SignId::new(id), offset)
}

/// A scan sitting in `state`, with or without an earlier closed zone.
fn scan_in(state: BoundaryState, closed_before: bool) -> ZoneScan {
    let mut scan = ZoneScan::new();
    if closed_before {
        scan.begin(m("b0", 0.0)).unwrap();
        scan.end(m("e0", 1.0)).unwrap();
    }
    if state == BoundaryState::Open {
        scan.begin(m("b1", 2.0)).unwrap();
    }
    scan
}

#[test]
fn boundary_transition_matrix_exhaustive() {
    let states = [BoundaryState::Closed, BoundaryState::Open];
    let events = [BoundaryEvent::Begin, BoundaryEvent::End];

    let expected_valid = [
        (BoundaryState::Closed, BoundaryEvent::Begin, BoundaryState::Open),
        (BoundaryState::Open, BoundaryEvent::End, BoundaryState::Closed),
    ];

    for from in states {
        for event in events {
            for closed_before in [false, true] {
                let mut scan = scan_in(from, closed_before);
                let before = scan.transitions().len();
                let result = scan.apply(event, m("x", 5.0));
                let expected = expected_valid
                    .iter()
                    .find(|(f, e, _)| *f == from && *e == event);

                match expected {
                    Some((_, _, to)) => {
                        assert!(result.is_ok(), "{from} --{event}--> should be accepted");
                        assert_eq!(scan.state(), *to);
                        assert_eq!(scan.transitions().len(), before + 1);
                        let rec = scan.transitions().last().unwrap();
                        assert_eq!(rec.from_state, from);
                        assert_eq!(rec.to_state, *to);
                        assert_eq!(rec.event, event);
                        assert_eq!(rec.sign_id, SignId::new("x"));
                    }
                    None => {
                        assert!(result.is_err(), "{from} --{event}--> should be rejected");
                        assert_eq!(scan.state(), from, "rejection must not move the state");
                        assert_eq!(scan.transitions().len(), before);
                    }
                }
            }
        }
    }
}

#[test]
fn valid_events_agree_with_matrix() {
    assert_eq!(BoundaryState::Closed.valid_events(), &[BoundaryEvent::Begin]);
    assert_eq!(BoundaryState::Open.valid_events(), &[BoundaryEvent::End]);
}

#[test]
fn rejected_pairs_name_the_right_error() {
    let mut open = scan_in(BoundaryState::Open, false);
    assert_eq!(
        open.apply(BoundaryEvent::Begin, m("x", 5.0)),
        Err(ZoneScanError::DuplicateStart {
            open: SignId::new("b1"),
            repeated: SignId::new("x"),
        })
    );

    let mut fresh = scan_in(BoundaryState::Closed, false);
    assert_eq!(
        fresh.apply(BoundaryEvent::End, m("x", 5.0)),
        Err(ZoneScanError::Unopened {
            sign_id: SignId::new("x")
        })
    );

    let mut reclosed = scan_in(BoundaryState::Closed, true);
    assert_eq!(
        reclosed.apply(BoundaryEvent::End, m("x", 5.0)),
        Err(ZoneScanError::DuplicateEnd {
            closed_by: SignId::new("e0"),
            repeated: SignId::new("x"),
        })
    );
}

#[test]
fn finish_from_each_state() {
    assert!(scan_in(BoundaryState::Closed, true).finish().is_ok());
    assert_eq!(
        scan_in(BoundaryState::Open, false).finish(),
        Err(ZoneScanError::Unterminated {
            sign_id: SignId::new("b1")
        })
    );
}
