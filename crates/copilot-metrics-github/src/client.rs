//! GitHub REST API client
//!
//! Thin wrapper around a `reqwest::Client` that knows the Copilot usage,
//! team, membership and installation endpoints. Every non-2xx response is
//! turned into [`MetricsError::UpstreamUnavailable`].

use copilot_metrics_core::config::{AppConfig, DEFAULT_API_BASE};
use copilot_metrics_core::error::{MetricsError, Result};
use copilot_metrics_core::parse::parse_raw_days;
use copilot_metrics_core::types::RawDailyRecord;
use futures::future::try_join_all;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Media type requested from the REST API
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Pinned REST API version
pub const GITHUB_API_VERSION: &str = "2022-11-28";

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const CLIENT_USER_AGENT: &str = "copilot-metrics";

/// An organization the user can pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub login: String,
    pub description: String,
}

impl Organization {
    pub fn new(login: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            description: description.into(),
        }
    }

    /// Entry listed for an enterprise scope, which has no organization query
    pub fn enterprise_wide() -> Self {
        Self::new("<all>", "All organizations in the enterprise")
    }
}

#[derive(Debug, Deserialize)]
struct MembershipOrg {
    login: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Membership {
    organization: MembershipOrg,
    role: String,
}

#[derive(Debug, Deserialize)]
struct Team {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct InstallationAccount {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Installation {
    account: InstallationAccount,
}

#[derive(Debug, Deserialize)]
struct Installations {
    installations: Vec<Installation>,
}

/// Keep admin memberships only
fn admin_organizations(memberships: Vec<Membership>) -> Vec<Organization> {
    memberships
        .into_iter()
        .filter(|m| m.role == "admin")
        .map(|m| Organization {
            login: m.organization.login,
            description: m.organization.description.unwrap_or_default(),
        })
        .collect()
}

/// Client for one organization or enterprise scope
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    /// Scoped URL, e.g. `https://api.github.com/orgs/octodemo`
    api_url: String,
    /// Unscoped URL used for `/user/...` endpoints
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Build a client from the application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_url = config.api_url()?;
        let base_url = config.base_url().trim_end_matches('/').to_string();
        // Behind the proxy the gateway injects credentials
        let token = if config.github.use_proxy {
            None
        } else {
            config.github.token.clone()
        };
        Ok(Self::new(api_url, base_url, token))
    }

    /// Build a client against explicit URLs
    pub fn new(api_url: impl Into<String>, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            base_url: base_url.into(),
            token,
        }
    }

    /// Client for user-level endpoints of the public API with a user token
    pub fn for_user_token(token: impl Into<String>) -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_API_BASE, Some(token.into()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Headers sent with every request
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(GITHUB_API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| MetricsError::Config(format!("invalid token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// `GET` a URL and return the body of a successful response
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.http.get(url).headers(self.headers()?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::UpstreamUnavailable {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response.text().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Usage of the whole organization or enterprise
    pub fn usage_url(&self) -> String {
        format!("{}/copilot/usage", self.api_url)
    }

    /// Usage of one team
    pub fn team_usage_url(&self, team: &str) -> String {
        format!("{}/team/{}/copilot/usage", self.api_url, team.trim())
    }

    pub async fn copilot_usage(&self) -> Result<Vec<RawDailyRecord>> {
        let body = self.get_text(&self.usage_url()).await?;
        let days = parse_raw_days(&body)?;
        info!("Fetched {} days of Copilot usage", days.len());
        Ok(days)
    }

    /// Usage of one team; a blank team name yields no days without a request
    pub async fn team_usage(&self, team: &str) -> Result<Vec<RawDailyRecord>> {
        if team.trim().is_empty() {
            return Ok(Vec::new());
        }
        let body = self.get_text(&self.team_usage_url(team)).await?;
        parse_raw_days(&body)
    }

    /// Usage of several teams fetched concurrently, in the order given
    ///
    /// The first failure fails the whole call.
    pub async fn teams_usage(&self, teams: &[String]) -> Result<Vec<(String, Vec<RawDailyRecord>)>> {
        let fetches = teams.iter().map(|team| async move {
            let days = self.team_usage(team).await?;
            Ok::<_, MetricsError>((team.clone(), days))
        });
        try_join_all(fetches).await
    }

    /// Team slugs in the scope
    pub async fn teams(&self) -> Result<Vec<String>> {
        let teams: Vec<Team> = self.get_json(&format!("{}/teams", self.api_url)).await?;
        Ok(teams.into_iter().map(|t| t.slug).collect())
    }

    /// Organizations where the user is an admin
    pub async fn admin_organizations(&self) -> Result<Vec<Organization>> {
        let url = format!("{}/user/memberships/orgs", self.base_url);
        let memberships: Vec<Membership> = self.get_json(&url).await?;
        Ok(admin_organizations(memberships))
    }

    /// Account logins the GitHub App is installed on
    pub async fn installation_accounts(&self) -> Result<Vec<String>> {
        let url = format!("{}/user/installations", self.base_url);
        let installations: Installations = self.get_json(&url).await?;
        Ok(installations
            .installations
            .into_iter()
            .map(|i| i.account.login)
            .collect())
    }
}
