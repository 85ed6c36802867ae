use std::collections::BTreeMap;

use crate::aggregate::aggregate;
use crate::models::{FetchedEvents, Period};

/// Hours per client over a period, ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateReport {
    pub period: Period,
    /// Iterates in client-label order
    pub hours: BTreeMap<String, f64>,
    pub has_truncation: bool,
    pub event_count: usize,
}

impl AggregateReport {
    pub fn new(period: Period, fetched: &FetchedEvents) -> Self {
        Self {
            period,
            hours: aggregate(&fetched.events),
            has_truncation: fetched.has_truncation,
            event_count: fetched.events.len(),
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.hours.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }
}
