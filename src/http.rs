use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking agent shared by the OAuth and calendar calls.
///
/// Non-2xx responses are returned as responses so callers can read the
/// provider's error body.
pub fn agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

/// Error body on one line, capped for log and error messages.
pub(crate) fn snippet(body: &str) -> String {
    let line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() > 200 {
        format!("{}…", line.chars().take(200).collect::<String>())
    } else {
        line
    }
}
