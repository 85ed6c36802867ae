//! # Calendar Module
//!
//! One time-bounded query against a calendar and the normalization of its
//! raw entries into [`Event`]s clamped to the requested period.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http::snippet;
use crate::models::{Event, FetchedEvents, Period, StoredToken};

/// Entries requested per call. Only the first page is read.
pub const MAX_RESULTS: u32 = 100;
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

const USER_AGENT: &str = concat!("calendar-hours/", env!("CARGO_PKG_VERSION"));

/// One page of an events listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub items: Vec<RawEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<RawEventTime>,
    #[serde(default)]
    pub end: Option<RawEventTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventTime {
    /// RFC 3339 instant of a timed event
    #[serde(default)]
    pub date_time: Option<String>,
    /// Set instead of `date_time` for all-day events
    #[serde(default)]
    pub date: Option<String>,
}

/// Remote listing of events, expanded into single occurrences and ordered by
/// start time.
pub trait CalendarSource {
    fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        period: &Period,
    ) -> Result<EventPage>;
}

/// Google Calendar v3 over blocking HTTP.
#[derive(Clone)]
pub struct GoogleCalendar {
    agent: ureq::Agent,
    base_url: String,
}

impl GoogleCalendar {
    pub fn new(agent: ureq::Agent) -> Self {
        Self::with_base_url(agent, GOOGLE_CALENDAR_API)
    }

    pub fn with_base_url(agent: ureq::Agent, base_url: impl Into<String>) -> Self {
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl CalendarSource for GoogleCalendar {
    fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        period: &Period,
    ) -> Result<EventPage> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        debug!(%url, start = %period.start(), end = %period.end(), "listing events");

        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {access_token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .query("timeMin", period.start().to_rfc3339())
            .query("timeMax", period.end().to_rfc3339())
            .query("maxResults", MAX_RESULTS.to_string())
            .query("singleEvents", "true")
            .query("orderBy", "startTime")
            .call()
            .map_err(|e| Error::RemoteFetch(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::RemoteFetch(format!(
                "calendar API returned {status}: {}",
                snippet(&body)
            )));
        }

        response
            .body_mut()
            .read_json::<EventPage>()
            .map_err(|e| Error::RemoteFetch(format!("invalid events response: {e}")))
    }
}

/// Fetch the events of `calendar_id` starting within `period`, clamping each
/// to the period end.
///
/// Any malformed entry fails the whole fetch.
pub fn fetch_events(
    source: &impl CalendarSource,
    credential: &StoredToken,
    calendar_id: &str,
    period: &Period,
) -> Result<FetchedEvents> {
    if calendar_id.trim().is_empty() {
        return Err(Error::Configuration("calendar id must not be empty".into()));
    }

    let page = source.list_events(&credential.access_token, calendar_id, period)?;
    if page.next_page_token.is_some() {
        warn!(
            limit = MAX_RESULTS,
            "calendar returned more events than one page holds, later events are not counted"
        );
    }
    if page.items.is_empty() {
        info!("No events found.");
        return Ok(FetchedEvents::default());
    }

    let mut fetched = FetchedEvents::default();
    for raw in page.items {
        fetched.push(normalize(raw, period)?);
    }
    debug!(
        events = fetched.events.len(),
        truncated = fetched.has_truncation,
        "events normalized"
    );
    Ok(fetched)
}

fn normalize(raw: RawEvent, period: &Period) -> Result<Event> {
    let id = raw.id.unwrap_or_else(|| "<no id>".to_string());
    let client = raw.summary.ok_or_else(|| Error::MalformedEvent {
        id: id.clone(),
        reason: "missing summary".into(),
    })?;
    let start = instant(&id, "start", raw.start)?;
    let end = instant(&id, "end", raw.end)?;

    let tz = period.timezone();
    Ok(Event::within(
        period,
        client,
        start.with_timezone(&tz),
        end.with_timezone(&tz),
    ))
}

fn instant(id: &str, field: &str, time: Option<RawEventTime>) -> Result<DateTime<FixedOffset>> {
    let malformed = |reason: String| Error::MalformedEvent {
        id: id.to_string(),
        reason,
    };
    let time = time.ok_or_else(|| malformed(format!("missing {field}")))?;
    match (time.date_time, time.date) {
        (Some(s), _) => DateTime::parse_from_rfc3339(&s)
            .map_err(|e| malformed(format!("invalid {field}.dateTime '{s}': {e}"))),
        (None, Some(date)) => Err(malformed(format!(
            "all-day {field} ({date}) has no {field}.dateTime"
        ))),
        (None, None) => Err(malformed(format!("missing {field}.dateTime"))),
    }
}
