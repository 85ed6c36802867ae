//! Error kinds surfaced by the credential, fetch and aggregation stages.
//!
//! Every failure is fatal to the run. The only recovery path lives in
//! [`crate::auth::CredentialProvider::obtain`], which falls back to the
//! interactive flow when a refresh ends in [`Error::Authentication`].

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid local configuration (client secret, dates, timezone)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token refresh or interactive authorization failed
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Network failure or non-success response from the calendar API
    #[error("remote fetch error: {0}")]
    RemoteFetch(String),

    /// A calendar entry lacks a field the report depends on
    #[error("malformed event {id}: {reason}")]
    MalformedEvent { id: String, reason: String },

    /// Reading or writing the cached token failed
    #[error("token cache {path}: {source}")]
    TokenStore {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }
}
