//! Persisted OAuth credential and the out-of-band client configuration.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Tokens younger than this margin before expiry are treated as expired.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Cached credential, written to the token store after every authorization
/// or refresh. Carries the client identity so a refresh does not need the
/// client-secret file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + TimeDelta::seconds(EXPIRY_SKEW_SECONDS) >= at,
            None => false,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired(now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether this token was granted every scope in `wanted`.
    pub fn covers(&self, wanted: &[&str]) -> bool {
        self.scopes.is_empty() || wanted.iter().all(|w| self.scopes.iter().any(|s| s == w))
    }
}

/// Installed-application client configuration as downloaded from the
/// provider console (`{"installed": {...}}` or `{"web": {...}}`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretFile {
    Installed(ClientSecret),
    Web(ClientSecret),
}

impl ClientSecret {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(raw)?;
        Ok(match file {
            ClientSecretFile::Installed(s) | ClientSecretFile::Web(s) => s,
        })
    }
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
