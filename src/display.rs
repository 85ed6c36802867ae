use anyhow::Result;
use std::fmt::Write as _;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::models::AggregateReport;

const PERIOD_FORMAT: &str = "%Y-%m-%d %H:%M %Z";
pub const TRUNCATION_WARNING: &str =
    "⚠️  Some events are ending after the requested period. Overflowing hours are not counted.";

/// Hours in shortest round-trip form, always with a fractional part
/// (`2.0`, `3.5`, `0.3333333333333333`).
pub fn format_hours(hours: f64) -> String {
    if hours.is_finite() && hours.fract() == 0.0 {
        format!("{hours:.1}")
    } else {
        hours.to_string()
    }
}

pub fn render_text(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Aggregates between {} and {}:",
        report.period.start().format(PERIOD_FORMAT),
        report.period.end().format(PERIOD_FORMAT)
    );
    if report.is_empty() {
        let _ = writeln!(out, "No events found.");
    }
    if report.has_truncation {
        let _ = writeln!(out, "{}", TRUNCATION_WARNING.yellow().bold());
    }
    for (client, hours) in &report.hours {
        let _ = writeln!(out, "{client}:\t{:>5} hours", format_hours(*hours));
    }
    out
}

pub fn print_text_output(report: &AggregateReport) {
    print!("{}", render_text(report));
}

pub fn build_json_output(report: &AggregateReport) -> serde_json::Value {
    let clients: Vec<serde_json::Value> = report
        .hours
        .iter()
        .map(|(client, hours)| serde_json::json!({ "client": client, "hours": hours }))
        .collect();

    serde_json::json!({
        "period": {
            "start": report.period.start().to_rfc3339(),
            "end": report.period.end().to_rfc3339(),
            "timezone": report.period.timezone().name(),
        },
        "has_truncation": report.has_truncation,
        "event_count": report.event_count,
        "clients": clients,
        "total_hours": report.total_hours(),
    })
}

pub fn print_json_output(report: &AggregateReport) -> Result<()> {
    println!("{}", serde_json::to_string(&build_json_output(report))?);
    Ok(())
}
