//! Read-only projections over a record's event sequence.
//!
//! Used by dashboard listings ("current" status/scope) and the public
//! audit-trail view. These functions never mutate or omit events.

use consay_core::models::event::ConsentEvent;

/// The most recent event for a record: greatest creation timestamp,
/// with `seq` as the tie-break when two events share a timestamp.
pub fn latest_event(events: &[ConsentEvent]) -> Option<&ConsentEvent> {
    events.iter().max_by_key(|e| (e.created_at, e.seq))
}

/// The full event sequence oldest-first.
pub fn chronological(events: &[ConsentEvent]) -> Vec<&ConsentEvent> {
    let mut ordered: Vec<&ConsentEvent> = events.iter().collect();
    ordered.sort_by_key(|e| (e.created_at, e.seq));
    ordered
}
