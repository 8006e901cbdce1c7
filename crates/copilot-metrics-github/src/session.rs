//! OAuth session gateway
//!
//! Keeps per-browser sessions in memory, drives the OAuth callback and
//! hands out the bearer credentials to attach to proxied API calls.
//!
//! A public app deployment serves many organizations. After login it looks
//! up where the app is installed and preselects the first organization.

use crate::client::GithubClient;
use crate::oauth::{OAuthClient, TokenExchange, TokenSet, generate_state};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use copilot_metrics_core::config::AppConfig;
use copilot_metrics_core::error::{MetricsError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifier of a browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| MetricsError::InvalidArgument(format!("invalid session id: {e}")))
    }
}

/// Where users without any installation are sent
pub const APP_INSTALL_URL: &str = "https://github.com/apps/copilot-metrics-viewer";

/// State kept per session
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// `state` sent with the pending authorization request
    pub oauth_state: Option<String>,
    pub tokens: Option<TokenSet>,
    /// Organization picked by the user
    pub org: Option<String>,
    /// Organizations the app is installed on
    pub orgs: Vec<String>,
}

/// Query parameters GitHub sends to `/callback`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub installation_id: Option<String>,
    pub setup_action: Option<String>,
}

/// What the callback handler should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Tokens stored; send the user to the app
    Authenticated,
    /// The app was just installed; start the login again
    RestartLogin,
    /// `state` did not match the pending login
    InvalidState,
    /// Logged in, but the app is installed nowhere; send the user to
    /// [`APP_INSTALL_URL`]
    InstallApp,
    /// GitHub or the token endpoint reported an error
    Failed { error: String, description: String },
}

/// Lists the accounts the app is installed on, as seen by a user token
#[async_trait]
pub trait InstallationLister: Send + Sync {
    async fn installation_accounts(&self, access_token: &str) -> Result<Vec<String>>;
}

/// Asks `GET /user/installations` on the public API
#[derive(Debug, Clone, Copy, Default)]
pub struct UserInstallations;

#[async_trait]
impl InstallationLister for UserInstallations {
    async fn installation_accounts(&self, access_token: &str) -> Result<Vec<String>> {
        GithubClient::for_user_token(access_token)
            .installation_accounts()
            .await
    }
}

/// Shared in-memory session map
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Apply `f` to the session, creating it when missing
    pub async fn update<F, R>(&self, id: SessionId, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        f(sessions.entry(id).or_default())
    }

    pub async fn remove(&self, id: SessionId) -> Option<Session> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// OAuth session gateway
pub struct SessionGateway<E: TokenExchange = OAuthClient> {
    store: SessionStore,
    oauth: E,
    client_id: String,
    /// Server-side token that, when set, is used for every request
    static_token: Option<String>,
    /// Set for public app deployments
    installations: Option<Box<dyn InstallationLister>>,
}

impl SessionGateway<OAuthClient> {
    /// Gateway talking to github.com
    pub fn github(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client_id = client_id.into();
        let oauth = OAuthClient::new(client_id.clone(), client_secret);
        Self::new(oauth, client_id)
    }

    /// Gateway for the OAuth app, server token and deployment mode in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let oauth = OAuthClient::from_config(config)?;
        let client_id = config.github.client_id.clone().unwrap_or_default();
        let gateway = Self::new(oauth, client_id).with_static_token(config.github.token.clone());
        Ok(if config.github.public_app {
            gateway.with_installation_discovery(UserInstallations)
        } else {
            gateway
        })
    }

    /// Authorization URL for a new login from `host`
    pub async fn begin_login(&self, session: SessionId, host: &str) -> Result<String> {
        let state = self.prepare_login(session).await;
        self.oauth.authorize_url(host, &state)
    }
}

impl<E: TokenExchange> SessionGateway<E> {
    pub fn new(oauth: E, client_id: impl Into<String>) -> Self {
        Self {
            store: SessionStore::new(),
            oauth,
            client_id: client_id.into(),
            static_token: None,
            installations: None,
        }
    }

    /// Look up the user's organizations from app installations after login
    pub fn with_installation_discovery(mut self, lister: impl InstallationLister + 'static) -> Self {
        self.installations = Some(Box::new(lister));
        self
    }

    pub fn with_static_token(mut self, token: Option<String>) -> Self {
        self.static_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Store a fresh `state` for the session and return it
    pub async fn prepare_login(&self, session: SessionId) -> String {
        let state = generate_state();
        let stored = state.clone();
        self.store
            .update(session, move |s| s.oauth_state = Some(stored))
            .await;
        debug!("Started login for session {}", session);
        state
    }

    /// Handle the redirect back from GitHub
    pub async fn handle_callback(
        &self,
        session: SessionId,
        params: &CallbackParams,
    ) -> CallbackOutcome {
        self.handle_callback_at(session, params, Utc::now()).await
    }

    async fn handle_callback_at(
        &self,
        session: SessionId,
        params: &CallbackParams,
        now: DateTime<Utc>,
    ) -> CallbackOutcome {
        if let Some(error) = &params.error {
            warn!("OAuth callback error: {}", error);
            return CallbackOutcome::Failed {
                error: error.clone(),
                description: params.error_description.clone().unwrap_or_default(),
            };
        }

        if params.installation_id.is_some() && params.setup_action.as_deref() == Some("install") {
            info!("App installed, restarting login");
            return CallbackOutcome::RestartLogin;
        }

        let expected = self.store.get(session).await.and_then(|s| s.oauth_state);
        if expected.is_none() || expected != params.state {
            warn!("OAuth state mismatch for session {}", session);
            return CallbackOutcome::InvalidState;
        }

        let code = params.code.as_deref().unwrap_or_default();
        let tokens = match self.oauth.exchange_code(code).await {
            Ok(response) => response.into_token_set(now),
            Err(e) => Err(e),
        };

        match tokens {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.store
                    .update(session, move |s| {
                        s.oauth_state = None;
                        s.tokens = Some(tokens);
                    })
                    .await;
                info!("Session {} authenticated", session);
                match &self.installations {
                    Some(lister) => self.discover_orgs(session, lister.as_ref(), &access_token).await,
                    None => CallbackOutcome::Authenticated,
                }
            }
            Err(MetricsError::OAuth { error, description }) => {
                CallbackOutcome::Failed { error, description }
            }
            Err(e) => CallbackOutcome::Failed {
                error: "token_exchange_failed".to_string(),
                description: e.to_string(),
            },
        }
    }

    /// Store the organizations the app is installed on, first one selected
    async fn discover_orgs(
        &self,
        session: SessionId,
        lister: &dyn InstallationLister,
        access_token: &str,
    ) -> CallbackOutcome {
        let orgs = match lister.installation_accounts(access_token).await {
            Ok(orgs) => orgs,
            Err(e) => {
                warn!("Listing installations failed: {}", e);
                return CallbackOutcome::Failed {
                    error: "installations_unavailable".to_string(),
                    description: e.to_string(),
                };
            }
        };
        let Some(first) = orgs.first().cloned() else {
            info!("No installation for session {}", session);
            return CallbackOutcome::InstallApp;
        };
        debug!("Session {} can see {} organizations", session, orgs.len());
        self.store
            .update(session, move |s| {
                s.org = Some(first);
                s.orgs = orgs;
            })
            .await;
        CallbackOutcome::Authenticated
    }

    /// `Authorization` header value for an API call made on behalf of the session
    pub async fn authorize_request(&self, session: SessionId) -> Result<String> {
        self.authorize_request_at(session, Utc::now()).await
    }

    async fn authorize_request_at(&self, session: SessionId, now: DateTime<Utc>) -> Result<String> {
        if let Some(token) = &self.static_token {
            return Ok(format!("Bearer {token}"));
        }

        let tokens = self
            .store
            .get(session)
            .await
            .and_then(|s| s.tokens)
            .ok_or(MetricsError::Unauthorized)?;

        if !tokens.is_expired(now) {
            return Ok(format!("Bearer {}", tokens.access_token));
        }

        let Some(refresh) = tokens.refresh_token.as_deref() else {
            return Err(MetricsError::Unauthorized);
        };
        debug!("Token of session {} expired, refreshing", session);
        let refreshed = self.oauth.refresh_token(refresh).await?.into_token_set(now)?;
        let header = format!("Bearer {}", refreshed.access_token);
        self.store
            .update(session, move |s| s.tokens = Some(refreshed))
            .await;
        Ok(header)
    }

    /// Remember the organization picked by the user
    pub async fn select_org(&self, session: SessionId, org: impl Into<String>) {
        let org = org.into();
        self.store.update(session, move |s| s.org = Some(org)).await;
    }

    /// Forget everything about the session
    pub async fn logout(&self, session: SessionId) {
        if self.store.remove(session).await.is_some() {
            info!("Session {} logged out", session);
        }
    }
}
