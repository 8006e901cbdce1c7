//! Application configuration
//!
//! Configuration is read once at startup (environment first, then command
//! line overrides) into an [`AppConfig`] that is passed by reference to the
//! API client and the session gateway.

use crate::error::{MetricsError, Result};
use std::env;
use tracing::debug;

/// Public GitHub REST API
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Where a locally running session gateway exposes its GitHub proxy
pub const DEFAULT_PROXY_BASE: &str = "http://localhost:3000/api/github";

/// Environment variable names
pub mod vars {
    pub const MOCKED_DATA: &str = "MOCKED_DATA";
    pub const GITHUB_ORG: &str = "GITHUB_ORG";
    pub const GITHUB_ENT: &str = "GITHUB_ENT";
    pub const GITHUB_TEAM: &str = "GITHUB_TEAM";
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    pub const USE_PROXY: &str = "USE_PROXY";
    pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
    pub const GITHUB_PROXY_URL: &str = "GITHUB_PROXY_URL";
    pub const GITHUB_CLIENT_ID: &str = "GITHUB_CLIENT_ID";
    pub const GITHUB_CLIENT_SECRET: &str = "GITHUB_CLIENT_SECRET";
    pub const PUBLIC_APP: &str = "PUBLIC_APP";
}

/// Whether metrics are queried for an organization or an enterprise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Organization(String),
    Enterprise(String),
}

impl Scope {
    /// The organization or enterprise name
    pub fn name(&self) -> &str {
        match self {
            Self::Organization(name) | Self::Enterprise(name) => name,
        }
    }

    /// Path segment under the API base
    pub fn path(&self) -> String {
        match self {
            Self::Organization(org) => format!("orgs/{org}"),
            Self::Enterprise(ent) => format!("enterprises/{ent}"),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organization(name) => write!(f, "organization {name}"),
            Self::Enterprise(name) => write!(f, "enterprise {name}"),
        }
    }
}

/// GitHub related settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GithubConfig {
    pub org: Option<String>,
    pub ent: Option<String>,
    pub team: Option<String>,
    /// Token sent as bearer credentials; not needed behind the proxy
    pub token: Option<String>,
    /// Route API calls through the session gateway, which holds the token
    pub use_proxy: bool,
    pub api_base: Option<String>,
    pub proxy_base: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// One deployment serving many organizations; the user's organizations
    /// come from the app installations after login
    pub public_app: bool,
}

/// Top level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Serve embedded fixtures instead of calling GitHub
    pub mocked_data: bool,
    pub github: GithubConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_string(key: &str) -> Option<String> {
    non_empty(env::var(key).ok())
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|v| v == "true").unwrap_or(false)
}

impl AppConfig {
    /// Read configuration from the environment
    pub fn from_env() -> Self {
        let config = Self {
            mocked_data: env_flag(vars::MOCKED_DATA),
            github: GithubConfig {
                org: env_string(vars::GITHUB_ORG),
                ent: env_string(vars::GITHUB_ENT),
                team: env_string(vars::GITHUB_TEAM),
                token: env_string(vars::GITHUB_TOKEN),
                use_proxy: env_flag(vars::USE_PROXY),
                api_base: env_string(vars::GITHUB_API_URL),
                proxy_base: env_string(vars::GITHUB_PROXY_URL),
                client_id: env_string(vars::GITHUB_CLIENT_ID),
                client_secret: env_string(vars::GITHUB_CLIENT_SECRET),
                public_app: env_flag(vars::PUBLIC_APP),
            },
        };
        debug!(
            mocked = config.mocked_data,
            proxy = config.github.use_proxy,
            "Loaded configuration from environment"
        );
        config
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.github.org = non_empty(Some(org.into()));
        self
    }

    pub fn with_enterprise(mut self, ent: impl Into<String>) -> Self {
        self.github.ent = non_empty(Some(ent.into()));
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.github.team = non_empty(Some(team.into()));
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.github.token = non_empty(Some(token.into()));
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.github.client_id = non_empty(Some(client_id.into()));
        self
    }

    pub fn with_public_app(mut self, public_app: bool) -> Self {
        self.github.public_app = public_app;
        self
    }

    pub fn with_mocked_data(mut self, mocked: bool) -> Self {
        self.mocked_data = mocked;
        self
    }

    pub fn with_proxy(mut self, use_proxy: bool) -> Self {
        self.github.use_proxy = use_proxy;
        self
    }

    /// Resolve the scope; an organization takes precedence over an enterprise
    pub fn scope(&self) -> Option<Scope> {
        if let Some(org) = &self.github.org {
            Some(Scope::Organization(org.clone()))
        } else {
            self.github.ent.clone().map(Scope::Enterprise)
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        if self.github.use_proxy {
            self.github
                .proxy_base
                .as_deref()
                .unwrap_or(DEFAULT_PROXY_BASE)
        } else {
            self.github.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
        }
    }

    /// Scoped API URL, e.g. `https://api.github.com/orgs/octodemo`
    pub fn api_url(&self) -> Result<String> {
        let scope = self.scope().ok_or_else(|| {
            MetricsError::Config("organization or enterprise needs to be provided".to_string())
        })?;
        Ok(format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            scope.path()
        ))
    }

    /// Check that the configuration is usable
    ///
    /// Mocked data and the proxy do not need a token; direct API access does.
    pub fn validate(&self) -> Result<()> {
        if self.scope().is_none() {
            return Err(MetricsError::Config(
                "organization or enterprise needs to be provided".to_string(),
            ));
        }
        if self.mocked_data || self.github.use_proxy {
            return Ok(());
        }
        if self.github.token.is_none() {
            return Err(MetricsError::Config(format!(
                "a GitHub token is required; set {} or pass --token",
                vars::GITHUB_TOKEN
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EnvVarGuard;

    const ALL_VARS: &[&str] = &[
        vars::MOCKED_DATA,
        vars::GITHUB_ORG,
        vars::GITHUB_ENT,
        vars::GITHUB_TEAM,
        vars::GITHUB_TOKEN,
        vars::USE_PROXY,
        vars::GITHUB_API_URL,
        vars::GITHUB_PROXY_URL,
        vars::GITHUB_CLIENT_ID,
        vars::GITHUB_CLIENT_SECRET,
        vars::PUBLIC_APP,
    ];

    #[test]
    fn test_from_env() {
        let mut guard = EnvVarGuard::cleared(ALL_VARS);
        guard.set(vars::GITHUB_ORG, "octodemo");
        guard.set(vars::GITHUB_TEAM, "  ");
        guard.set(vars::MOCKED_DATA, "true");
        guard.set(vars::USE_PROXY, "yes");

        let config = AppConfig::from_env();
        assert!(config.mocked_data);
        // Only the literal "true" enables a flag
        assert!(!config.github.use_proxy);
        assert_eq!(config.github.org.as_deref(), Some("octodemo"));
        assert_eq!(config.github.team, None);
        assert!(!config.github.public_app);
        assert_eq!(config.scope(), Some(Scope::Organization("octodemo".into())));
    }

    #[test]
    fn test_from_env_team_and_oauth_app() {
        let mut guard = EnvVarGuard::cleared(ALL_VARS);
        guard.set(vars::GITHUB_TEAM, "platform");
        guard.set(vars::GITHUB_CLIENT_ID, "Iv1.abc");
        guard.set(vars::GITHUB_CLIENT_SECRET, "s3cret");
        guard.set(vars::PUBLIC_APP, "true");

        let config = AppConfig::from_env();
        assert_eq!(config.github.team.as_deref(), Some("platform"));
        assert_eq!(config.github.client_id.as_deref(), Some("Iv1.abc"));
        assert_eq!(config.github.client_secret.as_deref(), Some("s3cret"));
        assert!(config.github.public_app);

        let config = config.with_team("data").with_client_id("Iv1.xyz");
        assert_eq!(config.github.team.as_deref(), Some("data"));
        assert_eq!(config.github.client_id.as_deref(), Some("Iv1.xyz"));
    }

    #[test]
    fn test_org_takes_precedence_over_enterprise() {
        let config = AppConfig::default()
            .with_enterprise("acme")
            .with_org("octodemo");
        assert_eq!(config.scope(), Some(Scope::Organization("octodemo".into())));

        let config = AppConfig::default().with_enterprise("acme");
        assert_eq!(config.scope(), Some(Scope::Enterprise("acme".into())));
        assert_eq!(config.scope().unwrap().to_string(), "enterprise acme");
    }

    #[test]
    fn test_api_url() {
        let config = AppConfig::default().with_org("octodemo");
        assert_eq!(
            config.api_url().unwrap(),
            "https://api.github.com/orgs/octodemo"
        );

        let config = AppConfig::default().with_enterprise("acme").with_proxy(true);
        assert_eq!(
            config.api_url().unwrap(),
            "http://localhost:3000/api/github/enterprises/acme"
        );

        let mut config = AppConfig::default().with_org("octodemo");
        config.github.api_base = Some("https://ghe.example.com/api/v3/".to_string());
        assert_eq!(
            config.api_url().unwrap(),
            "https://ghe.example.com/api/v3/orgs/octodemo"
        );

        assert!(AppConfig::default().api_url().is_err());
    }

    #[test]
    fn test_validate() {
        // Scope is mandatory
        assert!(AppConfig::default().with_token("t").validate().is_err());

        // Direct access needs a token
        let config = AppConfig::default().with_org("octodemo");
        assert!(matches!(config.validate(), Err(MetricsError::Config(_))));
        assert!(config.clone().with_token("ghp_x").validate().is_ok());

        // Mocked data and the proxy do not
        assert!(config.clone().with_mocked_data(true).validate().is_ok());
        assert!(config.with_proxy(true).validate().is_ok());
    }

    #[test]
    fn test_blank_builder_values_are_ignored() {
        let config = AppConfig::default().with_org("  ").with_token("");
        assert_eq!(config.scope(), None);
        assert_eq!(config.github.token, None);
    }
}
