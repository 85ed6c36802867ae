use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::Period;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// A calendar entry attributed to a client, clamped to the requested period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub client: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// `min(end, period end)`
    pub truncated_end: DateTime<Tz>,
    pub duration_hours: f64,
}

impl Event {
    pub fn within(
        period: &Period,
        client: impl Into<String>,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> Self {
        let truncated_end = end.min(period.end());
        let millis = (truncated_end - start).num_milliseconds().max(0);
        Self {
            client: client.into(),
            start,
            end,
            truncated_end,
            duration_hours: millis as f64 / MILLIS_PER_HOUR,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.end > self.truncated_end
    }
}

/// Normalized events of one fetch plus whether any of them overflowed the period.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedEvents {
    pub events: Vec<Event>,
    pub has_truncation: bool,
}

impl FetchedEvents {
    pub fn push(&mut self, event: Event) {
        self.has_truncation |= event.is_truncated();
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for FetchedEvents {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut fetched = FetchedEvents::default();
        for event in iter {
            fetched.push(event);
        }
        fetched
    }
}
