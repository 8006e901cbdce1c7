//! Usage data sources
//!
//! [`UsageSource`] abstracts over the live GitHub API and the embedded demo
//! fixtures so the CLI never needs to know which one it talks to.

use crate::client::{GithubClient, Organization};
use async_trait::async_trait;
use copilot_metrics_core::config::{AppConfig, Scope};
use copilot_metrics_core::error::{MetricsError, Result};
use copilot_metrics_core::parse::parse_raw_days;
use copilot_metrics_core::types::RawDailyRecord;
use tracing::info;

const ORGANIZATION_SAMPLE: &str = include_str!("../fixtures/organization_response_sample.json");
const ENTERPRISE_SAMPLE: &str = include_str!("../fixtures/enterprise_response_sample.json");

/// Where raw usage and scope listings come from
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Raw usage of the configured scope
    async fn usage(&self) -> Result<Vec<RawDailyRecord>>;

    /// Raw usage of one team; blank names yield no days
    async fn team_usage(&self, team: &str) -> Result<Vec<RawDailyRecord>>;

    /// Organizations available to pick
    async fn organizations(&self) -> Result<Vec<Organization>>;

    /// Team slugs in the scope
    async fn teams(&self) -> Result<Vec<String>>;
}

/// Live API source
pub struct LiveSource {
    client: GithubClient,
    scope: Scope,
}

impl LiveSource {
    pub fn new(client: GithubClient, scope: Scope) -> Self {
        Self { client, scope }
    }
}

#[async_trait]
impl UsageSource for LiveSource {
    async fn usage(&self) -> Result<Vec<RawDailyRecord>> {
        self.client.copilot_usage().await
    }

    async fn team_usage(&self, team: &str) -> Result<Vec<RawDailyRecord>> {
        self.client.team_usage(team).await
    }

    async fn organizations(&self) -> Result<Vec<Organization>> {
        match self.scope {
            Scope::Enterprise(_) => Ok(vec![Organization::enterprise_wide()]),
            Scope::Organization(_) => self.client.admin_organizations().await,
        }
    }

    async fn teams(&self) -> Result<Vec<String>> {
        self.client.teams().await
    }
}

/// Embedded demo data
///
/// The sample is chosen by scope kind. Team usage serves the same sample for
/// any non-blank team; the team list is empty.
pub struct MockSource {
    scope: Scope,
}

impl MockSource {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    fn sample(&self) -> &'static str {
        match self.scope {
            Scope::Organization(_) => ORGANIZATION_SAMPLE,
            Scope::Enterprise(_) => ENTERPRISE_SAMPLE,
        }
    }
}

#[async_trait]
impl UsageSource for MockSource {
    async fn usage(&self) -> Result<Vec<RawDailyRecord>> {
        parse_raw_days(self.sample())
    }

    async fn team_usage(&self, team: &str) -> Result<Vec<RawDailyRecord>> {
        if team.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_raw_days(self.sample())
    }

    async fn organizations(&self) -> Result<Vec<Organization>> {
        Ok(vec![Organization::new("octodemo", "GitHub Demo Organization")])
    }

    async fn teams(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Pick the source matching the configuration
pub fn source_from_config(config: &AppConfig) -> Result<Box<dyn UsageSource>> {
    config.validate()?;
    let scope = config.scope().ok_or_else(|| {
        MetricsError::Config("organization or enterprise needs to be provided".to_string())
    })?;

    if config.mocked_data {
        info!("Using mock data for {}", scope);
        return Ok(Box::new(MockSource::new(scope)));
    }

    let client = GithubClient::from_config(config)?;
    info!("Querying {} at {}", scope, client.api_url());
    Ok(Box::new(LiveSource::new(client, scope)))
}
