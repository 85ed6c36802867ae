//! # Aggregate Module
//!
//! Groups normalized events by client label and sums their truncated
//! durations.

use std::collections::BTreeMap;

use crate::models::Event;

/// Sum `duration_hours` per client.
///
/// Labels are matched exactly (case-sensitive). Each group is summed in
/// ascending duration order so the result does not depend on the order of
/// `events`.
pub fn aggregate(events: &[Event]) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for e in events {
        groups.entry(e.client.as_str()).or_default().push(e.duration_hours);
    }

    groups
        .into_iter()
        .map(|(client, mut durations)| {
            durations.sort_by(f64::total_cmp);
            (client.to_string(), durations.into_iter().sum::<f64>())
        })
        .collect()
}
