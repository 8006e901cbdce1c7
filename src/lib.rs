//! copilot-metrics - Fetch and normalize GitHub Copilot usage metrics
//!
//! This library provides functionality to:
//! - Normalize raw `copilot/usage` days into the per-editor, per-model,
//!   per-language metrics model
//! - Synthesize github.com chat and pull request activity for demo fixtures
//! - Filter days by range and render them as tables or JSON
//!
//! GitHub access (API client, mock data, OAuth sessions) lives in the
//! `copilot-metrics-github` crate; types and configuration in
//! `copilot-metrics-core`.
//!
//! # Examples
//!
//! ```no_run
//! use copilot_metrics::aggregation::normalize;
//! use copilot_metrics_core::AppConfig;
//! use copilot_metrics_github::source_from_config;
//!
//! #[tokio::main]
//! async fn main() -> copilot_metrics::Result<()> {
//!     let config = AppConfig::from_env().with_org("octodemo").with_mocked_data(true);
//!     let source = source_from_config(&config)?;
//!     let days = normalize(&source.usage().await?);
//!     println!("{} days", days.len());
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod filters;
pub mod output;
pub mod synthetic;

// Re-export commonly used types
pub use aggregation::{DotcomSource, Passthrough, normalize, normalize_json, normalize_with};
pub use copilot_metrics_core::{MetricsError, NormalizedDay, RawDailyRecord, Result, UsageTotals};
pub use synthetic::{OsRandom, RandomSource, Synthetic};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
