//! CLI interface for copilot-metrics
//!
//! Global flags select the organization or enterprise and how GitHub is
//! reached; subcommands pick the report.
//!
//! # Example
//!
//! ```bash
//! # Daily usage of an organization for the last week of June
//! copilot-metrics --org octodemo usage --since 2024-06-24 --until 2024-06-30
//!
//! # Convert a raw sample into a demo fixture with github.com activity
//! copilot-metrics convert sample.json --output sample.v2.json --synthetic
//! ```

use copilot_metrics_core::config::{AppConfig, vars};
use copilot_metrics_core::error::{MetricsError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fetch and normalize GitHub Copilot usage metrics
#[derive(Parser, Debug, Clone)]
#[command(name = "copilot-metrics")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Organization to query (takes precedence over --enterprise)
    #[arg(long, global = true, env = vars::GITHUB_ORG)]
    pub org: Option<String>,

    /// Enterprise to query
    #[arg(long, global = true, env = vars::GITHUB_ENT)]
    pub enterprise: Option<String>,

    /// GitHub token
    #[arg(long, global = true, env = vars::GITHUB_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the REST API (GitHub Enterprise Server)
    #[arg(long, global = true, env = vars::GITHUB_API_URL)]
    pub api_url: Option<String>,

    /// Serve the embedded demo data instead of calling GitHub
    #[arg(long, global = true)]
    pub mocked: bool,

    /// Route requests through the session gateway proxy
    #[arg(long, global = true)]
    pub proxy: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show daily usage
    Usage {
        /// Team slug; shows the team instead of the whole scope [env: GITHUB_TEAM]
        #[arg(long)]
        team: Option<String>,

        /// Filter by start date (YYYY-MM-DD or YYYY-MM)
        #[arg(long)]
        since: Option<String>,

        /// Filter by end date (YYYY-MM-DD or YYYY-MM)
        #[arg(long)]
        until: Option<String>,
    },

    /// Normalize a raw usage file
    Convert {
        /// Raw `copilot/usage` JSON file
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Fill github.com chat and pull request data with random values
        #[arg(long)]
        synthetic: bool,
    },

    /// List organizations available to the token
    Orgs,

    /// List teams of the organization
    Teams,

    /// Print an OAuth authorization URL with a fresh state
    LoginUrl {
        /// Host the app is served from, e.g. localhost:3000
        #[arg(long, default_value = "localhost:3000")]
        host: String,

        /// OAuth client id of the GitHub App [env: GITHUB_CLIENT_ID]
        #[arg(long)]
        client_id: Option<String>,
    },
}

impl Cli {
    /// Environment configuration with command line overrides applied
    ///
    /// Command options that have an environment counterpart (`--team`,
    /// `--client-id`) land here too, so commands read them from the config.
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(org) = &self.org {
            config = config.with_org(org.as_str());
        }
        if let Some(ent) = &self.enterprise {
            config = config.with_enterprise(ent.as_str());
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.as_str());
        }
        if let Some(url) = &self.api_url {
            config.github.api_base = Some(url.clone());
        }
        if self.mocked {
            config = config.with_mocked_data(true);
        }
        if self.proxy {
            config = config.with_proxy(true);
        }
        match &self.command {
            Command::Usage { team: Some(team), .. } => config = config.with_team(team.as_str()),
            Command::LoginUrl {
                client_id: Some(id), ..
            } => config = config.with_client_id(id.as_str()),
            _ => {}
        }
        config
    }
}

/// Parse date filter from string
///
/// Supports YYYY-MM-DD and YYYY-MM (first day of the month).
///
/// # Examples
/// ```
/// use copilot_metrics::cli::parse_date_filter;
/// use chrono::Datelike;
///
/// let date = parse_date_filter("2024-06-24").unwrap();
/// assert_eq!(date.day(), 24);
///
/// let date = parse_date_filter("2024-06").unwrap();
/// assert_eq!(date.day(), 1);
/// ```
pub fn parse_date_filter(date_str: &str) -> Result<chrono::NaiveDate> {
    if let Ok(date) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some((year, month)) = date_str.split_once('-') else {
        return Err(MetricsError::InvalidDate(format!(
            "Invalid date format '{date_str}', expected YYYY-MM-DD or YYYY-MM"
        )));
    };
    let year = year
        .parse::<i32>()
        .map_err(|_| MetricsError::InvalidDate(format!("Invalid year in '{date_str}'")))?;
    let month = month
        .parse::<u32>()
        .map_err(|_| MetricsError::InvalidDate(format!("Invalid month in '{date_str}'")))?;
    if !(1..=12).contains(&month) {
        return Err(MetricsError::InvalidDate(format!(
            "Month must be between 1-12, got {month}"
        )));
    }
    chrono::NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| MetricsError::InvalidDate(format!("Invalid date: {date_str}")))
}
