//! GitHub OAuth web flow
//!
//! Builds the authorization URL and talks to the token endpoint for code
//! exchange and refresh.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use copilot_metrics_core::config::{AppConfig, vars};
use copilot_metrics_core::error::{MetricsError, Result};
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Raw token endpoint response
///
/// GitHub answers `200 OK` for failures too, with `error` set instead of a
/// token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: Option<i64>,
    pub refresh_token_expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Tokens held by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl TokenResponse {
    /// Turn the response into tokens, with the expiry relative to `now`
    pub fn into_token_set(self, now: DateTime<Utc>) -> Result<TokenSet> {
        if let Some(error) = self.error {
            return Err(MetricsError::OAuth {
                error,
                description: self.error_description.unwrap_or_default(),
            });
        }
        let access_token = self.access_token.ok_or_else(|| MetricsError::OAuth {
            error: "missing_token".to_string(),
            description: "token response carried no access token".to_string(),
        })?;
        Ok(TokenSet {
            access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }
}

/// Token endpoint operations used by the session gateway
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// Whether the redirect goes over plain http
fn is_localhost(host: &str) -> bool {
    let hostname = host.split(':').next().unwrap_or(host);
    hostname == "localhost"
}

/// Client of the GitHub OAuth endpoints
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: ACCESS_TOKEN_URL.to_string(),
        }
    }

    /// Client for the OAuth app named in the configuration
    ///
    /// The secret is only needed for the token endpoint, so a missing one is
    /// sent as empty.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client_id = config.github.client_id.as_deref().ok_or_else(|| {
            MetricsError::Config(format!(
                "an OAuth client id is required; set {} or pass --client-id",
                vars::GITHUB_CLIENT_ID
            ))
        })?;
        let client_secret = config.github.client_secret.as_deref().unwrap_or_default();
        Ok(Self::new(client_id, client_secret))
    }

    /// Override the token endpoint (GitHub Enterprise Server)
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Authorization URL redirecting back to `{protocol}://{host}/callback`
    ///
    /// Only `localhost` is sent over plain http.
    pub fn authorize_url(&self, host: &str, state: &str) -> Result<String> {
        let protocol = if is_localhost(host) { "http" } else { "https" };
        let redirect_uri = format!("{protocol}://{host}/callback");
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("state", state),
                ("redirect_uri", redirect_uri.as_str()),
            ],
        )
        .map_err(|e| MetricsError::InvalidArgument(format!("invalid host {host}: {e}")))?;
        Ok(url.into())
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Token endpoint answered {}", status);
            return Err(MetricsError::UpstreamUnavailable {
                url: self.token_url.clone(),
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenExchange for OAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        debug!("Exchanging OAuth code for a token");
        self.post_token(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing OAuth token");
        self.post_token(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

/// Random hex string used as the OAuth `state`
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    if getrandom::getrandom(&mut bytes).is_err() {
        // OS RNG unavailable; fall back to a unique but guessable value
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u128;
        let mixed = nanos ^ (std::process::id() as u128).rotate_left(17);
        bytes = mixed.to_le_bytes();
    }
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
