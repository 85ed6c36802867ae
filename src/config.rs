//! # Config Module
//!
//! Run-wide settings resolved once in `main`: the timezone, the instant
//! treated as "now", and the default locations of the client secret and the
//! token cache. Nothing below `main` reads the clock or the environment.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::Period;

pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";
pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const TOKEN_FILE: &str = "token.json";

/// Timezone and reference instant used to resolve the reporting period.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub timezone: Tz,
    pub now: DateTime<Utc>,
}

impl RunConfig {
    pub fn new(timezone: &str, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            timezone: parse_timezone(timezone)?,
            now,
        })
    }

    /// Resolve `--start` / `--end` into a period.
    ///
    /// Without a start, the period opens at midnight of the most recent
    /// Monday. Without an end, it closes at midnight eight days after that
    /// Monday, i.e. the Tuesday of the following week.
    pub fn resolve_period(&self, start: Option<&str>, end: Option<&str>) -> Result<Period> {
        let today = self.now.with_timezone(&self.timezone).date_naive();
        let weekday = i64::from(today.weekday().num_days_from_monday());

        let start_date = match start {
            Some(s) => parse_date(s)?,
            None => today - TimeDelta::days(weekday),
        };
        let end_date = match end {
            Some(s) => parse_date(s)?,
            None => today + TimeDelta::days(8 - weekday),
        };

        Period::new(
            local_midnight(self.timezone, start_date)?,
            local_midnight(self.timezone, end_date)?,
        )
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Configuration(format!("unknown timezone '{name}': {e}")))
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Configuration(format!("invalid date '{s}' (expected YYYY-MM-DD): {e}")))
}

/// Midnight of `date` in `tz`; inside a DST gap, the first hour that exists.
fn local_midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>> {
    let naive = date.and_time(NaiveTime::MIN);
    (0..=3)
        .find_map(|h| tz.from_local_datetime(&(naive + TimeDelta::hours(h))).earliest())
        .ok_or_else(|| Error::Configuration(format!("{date} has no valid midnight in {tz}")))
}

fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "calendar-hours").map(|d| d.config_dir().to_path_buf())
}

/// `credentials.json` in the platform config dir when present there,
/// otherwise in the working directory.
pub fn default_credentials_path() -> PathBuf {
    existing_or_local(CREDENTIALS_FILE)
}

/// `token.json` in the platform config dir when present there, otherwise in
/// the working directory.
pub fn default_token_path() -> PathBuf {
    existing_or_local(TOKEN_FILE)
}

fn existing_or_local(file: &str) -> PathBuf {
    if let Some(dir) = config_dir() {
        let candidate = dir.join(file);
        if candidate.is_file() {
            return candidate;
        }
    }
    PathBuf::from(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn config_at(y: i32, m: u32, d: u32, h: u32) -> RunConfig {
        RunConfig::new(
            DEFAULT_TIMEZONE,
            Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn default_period_spans_monday_to_next_tuesday() {
        // Thursday 2024-03-07
        let period = config_at(2024, 3, 7, 10).resolve_period(None, None).unwrap();
        assert_eq!(period.start().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(period.end().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(period.start().hour(), 0);
        assert_eq!(period.end().hour(), 0);
    }

    #[test]
    fn monday_starts_today() {
        let period = config_at(2024, 3, 4, 10).resolve_period(None, None).unwrap();
        assert_eq!(period.start().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(period.end().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }

    #[test]
    fn today_is_taken_in_the_configured_timezone() {
        // 23:30 UTC on Sunday is already Monday in Paris
        let cfg = RunConfig::new(
            "Europe/Paris",
            Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap(),
        )
        .unwrap();
        let period = cfg.resolve_period(None, None).unwrap();
        assert_eq!(period.start().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn explicit_dates_override_defaults() {
        let period = config_at(2024, 3, 7, 10)
            .resolve_period(Some("2024-01-01"), Some("2024-02-01"))
            .unwrap();
        assert_eq!(period.start().to_rfc3339(), "2024-01-01T00:00:00+01:00");
        assert_eq!(period.end().to_rfc3339(), "2024-02-01T00:00:00+01:00");
    }

    #[test]
    fn rejects_bad_input() {
        let cfg = config_at(2024, 3, 7, 10);
        assert!(matches!(
            cfg.resolve_period(Some("03/04/2024"), None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            cfg.resolve_period(Some("2024-03-10"), Some("2024-03-01")),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            RunConfig::new("Mars/Olympus", Utc::now()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn midnight_in_dst_gap_moves_forward() {
        // Clocks in Havana jumped from 00:00 to 01:00 on 2024-03-10
        let tz = parse_timezone("America/Havana").unwrap();
        let dt = local_midnight(tz, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()).unwrap();
        assert_eq!(dt.hour(), 1);
    }
}
