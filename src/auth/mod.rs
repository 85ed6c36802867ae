//! # Auth Module
//!
//! Produces a usable access token for the read-only calendar scope:
//! cached token if still valid, refreshed token if it can be refreshed,
//! otherwise a fresh interactive grant. Every new or refreshed token is
//! written back to the [`TokenStore`].

pub mod flow;
pub mod store;

pub use flow::{AuthFlow, GoogleAuthFlow};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{ClientSecret, StoredToken};

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
pub const SCOPES: &[&str] = &[CALENDAR_READONLY_SCOPE];

pub struct CredentialProvider<S, F> {
    store: S,
    flow: F,
    client_secret_path: PathBuf,
}

impl<S: TokenStore, F: AuthFlow> CredentialProvider<S, F> {
    pub fn new(store: S, flow: F, client_secret_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            flow,
            client_secret_path: client_secret_path.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    /// Return a valid credential, refreshing or re-authorizing as needed.
    ///
    /// A refresh rejected by the provider falls through to the interactive
    /// flow; any other refresh failure is returned as is.
    pub fn obtain(&self, now: DateTime<Utc>) -> Result<StoredToken> {
        let cached = self.store.load()?.filter(|token| {
            let covered = token.covers(SCOPES);
            if !covered {
                info!("cached token was granted other scopes, re-authorizing");
            }
            covered
        });

        if let Some(token) = cached {
            if token.is_valid(now) {
                debug!(expires_at = ?token.expires_at, "using cached token");
                return Ok(token);
            }
            if token.can_refresh() {
                match self.refresh(&token, now) {
                    Ok(refreshed) => return Ok(refreshed),
                    Err(e) if e.is_authentication() => {
                        warn!(error = %e, "token refresh failed, starting interactive authorization");
                    }
                    Err(e) => return Err(e),
                }
            } else {
                debug!("cached token expired and cannot be refreshed");
            }
        }

        self.authorize(now)
    }

    /// Refresh `token` and persist the result.
    pub fn refresh(&self, token: &StoredToken, now: DateTime<Utc>) -> Result<StoredToken> {
        let refreshed = self.flow.refresh(token, now)?;
        self.store.save(&refreshed)?;
        info!("access token refreshed");
        Ok(refreshed)
    }

    /// Run the interactive grant and persist the result.
    pub fn authorize(&self, now: DateTime<Utc>) -> Result<StoredToken> {
        let secret = load_client_secret(&self.client_secret_path)?;
        let token = self.flow.authorize(&secret, SCOPES, now)?;
        self.store.save(&token)?;
        Ok(token)
    }
}

pub fn load_client_secret(path: &Path) -> Result<ClientSecret> {
    let raw = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::Configuration(format!(
                "no valid cached token and no client secret at {}",
                path.display()
            ))
        } else {
            Error::Configuration(format!("cannot read client secret {}: {e}", path.display()))
        }
    })?;
    ClientSecret::from_json(&raw).map_err(|e| {
        Error::Configuration(format!("invalid client secret {}: {e}", path.display()))
    })
}
