use std::path::PathBuf;

use crate::config::DEFAULT_TIMEZONE;
use crate::http::DEFAULT_TIMEOUT_SECS;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Sum calendar hours per client over a period")]
pub struct Args {
    /// Calendar to read (e.g. primary, or an address like team@group.calendar.google.com)
    #[arg(short = 'c', long, env = "CALENDAR_HOURS_CALENDAR_ID")]
    pub calendar_id: String,

    /// Start date, YYYY-MM-DD (default: Monday of the current week)
    #[arg(short = 's', long)]
    pub start: Option<String>,

    /// End date, YYYY-MM-DD (default: Tuesday of next week)
    #[arg(short = 'e', long)]
    pub end: Option<String>,

    /// IANA time zone the dates are interpreted in
    #[arg(short = 'z', long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// OAuth client secret file. Defaults to credentials.json in the config dir or cwd
    #[arg(long, env = "CALENDAR_HOURS_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Token cache file. Defaults to token.json in the config dir or cwd
    #[arg(long, env = "CALENDAR_HOURS_TOKEN_CACHE")]
    pub token_cache: Option<PathBuf>,

    /// Loopback port for the authorization redirect (0 = any free port)
    #[arg(long, default_value_t = 0)]
    pub redirect_port: u16,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(long, env = "CALENDAR_HOURS_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}
