use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use calendar_hours::auth::{CredentialProvider, FileTokenStore, GoogleAuthFlow};
use calendar_hours::calendar::{GoogleCalendar, fetch_events};
use calendar_hours::cli::Args;
use calendar_hours::config::{RunConfig, default_credentials_path, default_token_path};
use calendar_hours::display::{print_json_output, print_text_output};
use calendar_hours::http;
use calendar_hours::models::AggregateReport;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={default_level}", env!("CARGO_CRATE_NAME")))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = RunConfig::new(&args.timezone, Utc::now()).context("resolve timezone")?;
    let period = config
        .resolve_period(args.start.as_deref(), args.end.as_deref())
        .context("resolve reporting period")?;
    tracing::debug!(start = %period.start(), end = %period.end(), "reporting period");

    let agent = http::agent(Duration::from_secs(args.timeout_secs));
    let token_path = args.token_cache.clone().unwrap_or_else(default_token_path);
    let secret_path = args.credentials.clone().unwrap_or_else(default_credentials_path);
    let provider = CredentialProvider::new(
        FileTokenStore::new(token_path),
        GoogleAuthFlow::new(agent.clone(), args.redirect_port),
        secret_path,
    );
    let credential = provider.obtain(config.now).with_context(|| {
        format!(
            "obtain calendar credentials (token cache {})",
            provider.store().path().display()
        )
    })?;

    let source = GoogleCalendar::new(agent);
    let fetched = fetch_events(&source, &credential, &args.calendar_id, &period)
        .with_context(|| format!("fetch events of calendar '{}'", args.calendar_id))?;

    let report = AggregateReport::new(period, &fetched);
    if args.json {
        print_json_output(&report)?;
    } else {
        print_text_output(&report);
    }
    Ok(())
}
