use chrono::TimeZone;
use chrono_tz::Europe::Paris;

use calendar_hours::display::{TRUNCATION_WARNING, build_json_output, format_hours, render_text};
use calendar_hours::models::{AggregateReport, Event, FetchedEvents, Period};

fn week() -> Period {
    Period::new(
        Paris.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
        Paris.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

fn report(events: &[(&str, (u32, u32, u32), (u32, u32, u32))]) -> AggregateReport {
    let period = week();
    let fetched: FetchedEvents = events
        .iter()
        .map(|(client, (d1, h1, m1), (d2, h2, m2))| {
            Event::within(
                &period,
                *client,
                Paris.with_ymd_and_hms(2024, 3, *d1, *h1, *m1, 0).unwrap(),
                Paris.with_ymd_and_hms(2024, 3, *d2, *h2, *m2, 0).unwrap(),
            )
        })
        .collect();
    AggregateReport::new(period, &fetched)
}

#[test]
fn hours_keep_a_fractional_part() {
    assert_eq!(format_hours(2.0), "2.0");
    assert_eq!(format_hours(3.5), "3.5");
    assert_eq!(format_hours(0.0), "0.0");
    assert_eq!(format_hours(1.0 / 3.0), "0.3333333333333333");
}

#[test]
fn text_report_lists_clients_in_label_order() {
    let text = render_text(&report(&[
        ("Zeta", (5, 9, 0), (5, 11, 0)),
        ("Acme", (5, 13, 0), (5, 14, 30)),
        ("Acme", (6, 9, 0), (6, 11, 0)),
    ]));
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Aggregates between 2024-03-04 00:00 CET and 2024-03-12 00:00 CET:");
    assert_eq!(lines[1], "Acme:\t  3.5 hours");
    assert_eq!(lines[2], "Zeta:\t  2.0 hours");
    assert_eq!(lines.len(), 3);
    assert!(!text.contains("Overflowing hours"));
}

#[test]
fn text_report_warns_about_truncation() {
    let text = render_text(&report(&[("Late", (11, 22, 0), (12, 2, 0))]));

    assert!(text.contains(TRUNCATION_WARNING));
    assert!(text.contains("Late:\t  2.0 hours"));
}

#[test]
fn text_report_for_empty_calendar() {
    let text = render_text(&report(&[]));
    assert!(text.starts_with("Aggregates between"));
    assert!(text.contains("No events found."));
    assert!(!text.contains("hours"));
}

#[test]
fn json_report_shape() {
    let json = build_json_output(&report(&[
        ("Acme", (5, 9, 0), (5, 10, 30)),
        ("Late", (11, 23, 0), (12, 1, 0)),
    ]));

    assert_eq!(json["period"]["start"], "2024-03-04T00:00:00+01:00");
    assert_eq!(json["period"]["end"], "2024-03-12T00:00:00+01:00");
    assert_eq!(json["period"]["timezone"], "Europe/Paris");
    assert_eq!(json["has_truncation"], true);
    assert_eq!(json["event_count"], 2);
    assert_eq!(json["clients"][0]["client"], "Acme");
    assert_eq!(json["clients"][0]["hours"], 1.5);
    assert_eq!(json["clients"][1]["client"], "Late");
    assert_eq!(json["clients"][1]["hours"], 1.0);
    assert_eq!(json["total_hours"], 2.5);
}
