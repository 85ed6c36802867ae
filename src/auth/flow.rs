//! OAuth 2.0 exchanges against the provider's token endpoint and the
//! installed-app loopback authorization flow.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::snippet;
use crate::models::{ClientSecret, StoredToken};

const USER_AGENT: &str = concat!("calendar-hours/", env!("CARGO_PKG_VERSION"));
const SUCCESS_PAGE: &str = "<html><body>The authentication flow has completed. \
     You may close this window.</body></html>";
const FAILURE_PAGE: &str = "<html><body>Authorization failed. \
     Check the terminal for details.</body></html>";

/// How long answered redirects get to flush before open connections are dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Shows the consent URL to the user.
pub type ConsentPrompt = Arc<dyn Fn(&str) + Send + Sync>;

/// Network side of credential acquisition.
pub trait AuthFlow {
    /// Trade the token's refresh token for a new access token.
    fn refresh(&self, token: &StoredToken, now: DateTime<Utc>) -> Result<StoredToken>;

    /// Ask the user to grant `scopes` and exchange the resulting code.
    fn authorize(
        &self,
        secret: &ClientSecret,
        scopes: &[&str],
        now: DateTime<Utc>,
    ) -> Result<StoredToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponseDto {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorDto {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google's OAuth endpoints over blocking HTTP.
#[derive(Clone)]
pub struct GoogleAuthFlow {
    agent: ureq::Agent,
    redirect_port: u16,
    prompt: ConsentPrompt,
}

impl GoogleAuthFlow {
    /// `redirect_port` 0 picks an ephemeral loopback port.
    pub fn new(agent: ureq::Agent, redirect_port: u16) -> Self {
        Self {
            agent,
            redirect_port,
            prompt: Arc::new(|url: &str| {
                eprintln!("Please visit this URL to authorize this application: {url}");
            }),
        }
    }

    /// Replace how the consent URL is shown (stderr by default).
    pub fn with_prompt(mut self, prompt: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.prompt = Arc::new(prompt);
        self
    }

    fn post_token(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponseDto> {
        let mut response = self
            .agent
            .post(token_uri)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send_form(form.iter().copied())
            .map_err(|e| Error::Authentication(format!("token endpoint {token_uri}: {e}")))?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Authentication(format!("reading token response: {e}")))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<TokenErrorDto>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {}", err.error, desc),
                    None => err.error,
                },
                Err(_) => snippet(&body),
            };
            return Err(Error::Authentication(format!(
                "token endpoint returned {status}: {detail}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Authentication(format!("invalid token response: {e}")))
    }
}

impl AuthFlow for GoogleAuthFlow {
    fn refresh(&self, token: &StoredToken, now: DateTime<Utc>) -> Result<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| Error::Authentication("token has no refresh token".into()))?;

        debug!(token_uri = %token.token_uri, "refreshing access token");
        let dto = self.post_token(
            &token.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
            ],
        )?;

        Ok(StoredToken {
            access_token: dto.access_token,
            refresh_token: dto.refresh_token.or_else(|| token.refresh_token.clone()),
            expires_at: expiry(now, dto.expires_in),
            client_id: token.client_id.clone(),
            client_secret: token.client_secret.clone(),
            token_uri: token.token_uri.clone(),
            scopes: dto
                .scope
                .map(|s| split_scopes(&s))
                .unwrap_or_else(|| token.scopes.clone()),
        })
    }

    fn authorize(
        &self,
        secret: &ClientSecret,
        scopes: &[&str],
        now: DateTime<Utc>,
    ) -> Result<StoredToken> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Authentication(format!("cannot start redirect listener: {e}")))?;

        let (redirect_uri, code) = runtime.block_on(async {
            let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
                .await
                .map_err(|e| Error::Authentication(format!("cannot listen for redirect: {e}")))?;
            let port = listener
                .local_addr()
                .map_err(|e| Error::Authentication(format!("cannot listen for redirect: {e}")))?
                .port();
            let redirect_uri = format!("http://127.0.0.1:{port}/");
            let state = uuid::Uuid::new_v4().simple().to_string();

            (self.prompt)(&consent_url(secret, &redirect_uri, scopes, &state));
            info!(port, "waiting for authorization redirect");

            let code = receive_code(listener, state).await?;
            Ok::<_, Error>((redirect_uri, code))
        })?;

        let dto = self.post_token(
            &secret.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
            ],
        )?;
        info!("authorization complete");

        Ok(StoredToken {
            access_token: dto.access_token,
            refresh_token: dto.refresh_token,
            expires_at: expiry(now, dto.expires_in),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            token_uri: secret.token_uri.clone(),
            scopes: dto
                .scope
                .map(|s| split_scopes(&s))
                .unwrap_or_else(|| scopes.iter().map(|s| s.to_string()).collect()),
        })
    }
}

fn expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| now + TimeDelta::seconds(secs))
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Consent page URL for an offline (refreshable) grant.
pub fn consent_url(secret: &ClientSecret, redirect_uri: &str, scopes: &[&str], state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
        secret.auth_uri,
        urlencoding::encode(&secret.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        urlencoding::encode(state),
    )
}

/// Query parameters of the provider's redirect back to the loopback listener.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Outcome of one request hitting the loopback listener.
#[derive(Debug, PartialEq, Eq)]
pub enum Callback {
    Code(String),
    Denied(String),
    StateMismatch,
    /// Not the redirect (a bare visit, a stray query)
    Other,
}

impl CallbackParams {
    pub fn outcome(self, expected_state: &str) -> Callback {
        if self.code.is_none() && self.error.is_none() {
            return Callback::Other;
        }
        if self.state.as_deref() != Some(expected_state) {
            return Callback::StateMismatch;
        }
        match (self.code, self.error) {
            (_, Some(error)) => Callback::Denied(error),
            (Some(code), None) => Callback::Code(code),
            (None, None) => Callback::Other,
        }
    }
}

struct RedirectState {
    expected_state: String,
    code_tx: Mutex<Option<oneshot::Sender<Result<String>>>>,
}

async fn redirect_handler(
    State(redirect): State<Arc<RedirectState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = match params.outcome(&redirect.expected_state) {
        Callback::Other => return (StatusCode::NOT_FOUND, Html("")),
        Callback::Code(code) => Ok(code),
        Callback::Denied(error) => Err(Error::Authentication(format!(
            "authorization denied: {error}"
        ))),
        Callback::StateMismatch => Err(Error::Authentication(
            "authorization redirect carried an unexpected state".into(),
        )),
    };
    let page = match outcome {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        Err(_) => (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE)),
    };

    let code_tx = redirect.code_tx.lock().ok().and_then(|mut slot| slot.take());
    match code_tx {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                debug!("authorization no longer waiting for a redirect");
            }
        }
        None => debug!("redirect received after the first one, ignoring"),
    }
    page
}

/// Serve the loopback redirect until the first decisive callback and return
/// its code.
///
/// Connections are served concurrently, so a browser's idle preconnect does
/// not hold up the real redirect.
async fn receive_code(listener: TcpListener, expected_state: String) -> Result<String> {
    let (code_tx, code_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let app = Router::new()
        .route("/", get(redirect_handler))
        .with_state(Arc::new(RedirectState {
            expected_state,
            code_tx: Mutex::new(Some(code_tx)),
        }));

    let server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .into_future(),
    );

    let outcome = code_rx
        .await
        .map_err(|_| Error::Authentication("redirect listener stopped".into()))?;

    if stop_tx.send(()).is_err() {
        debug!("redirect listener already stopped");
    }
    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => debug!(error = %e, "redirect listener failed while draining"),
        Ok(Err(e)) => debug!(error = %e, "redirect listener task aborted"),
        Err(_) => debug!("redirect listener still had open connections, dropping them"),
    }
    outcome
}
