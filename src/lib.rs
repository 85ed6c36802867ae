//! # Calendar Hours
//!
//! Reports the hours worked per client over a period, read from a Google
//! Calendar where each event title names the client.
//!
//! ## Overview
//!
//! A run goes through three stages, once, without retries:
//! - Credential provider: cached token, refresh, or interactive grant
//! - Event fetcher: one bounded listing, events clamped to the period end
//! - Aggregator: hours summed per client label
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Aggregation of event durations per client
pub mod aggregate;

/// OAuth credential acquisition and the token cache
pub mod auth;

/// Event listing and normalization
pub mod calendar;

/// Command-line argument parsing
pub mod cli;

/// Timezone, reference instant, period and path defaults
pub mod config;

/// Text and JSON report formatting
pub mod display;

/// Error kinds
pub mod error;

/// Shared HTTP agent
pub mod http;

/// Data models for events, periods, reports and tokens
pub mod models;

pub use error::{Error, Result};
