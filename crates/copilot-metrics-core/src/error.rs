//! Error types for copilot-metrics
//!
//! This module defines the error types used throughout the copilot-metrics
//! crates. All errors are derived from `thiserror` for convenient error
//! handling and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use copilot_metrics_core::error::{MetricsError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to MetricsError
//!     let _file = std::fs::read_to_string("nonexistent.json")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for copilot-metrics operations
///
/// Empty input is not an error: normalizing zero days yields zero days.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A raw usage record is missing a required field or has a mis-typed one
    #[error("Malformed usage record at day {day}, field `{field}`: {reason}")]
    MalformedInput {
        /// Index of the offending day in the input batch
        day: usize,
        /// Path of the offending field within the day record
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// A call to the GitHub API (or the proxy in front of it) failed
    #[error("Upstream unavailable ({url}): {reason}")]
    UpstreamUnavailable {
        /// The URL that was requested
        url: String,
        /// Transport error or HTTP status description
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// OAuth token endpoint returned an error
    #[error("OAuth error: {error} - {description}")]
    OAuth {
        /// `error` field returned by GitHub
        error: String,
        /// `error_description` field returned by GitHub
        description: String,
    },

    /// No token is available for the request
    #[error("Unauthorized")]
    Unauthorized,

    /// OAuth callback state did not match the session
    #[error("Invalid state")]
    InvalidState,
}

impl From<reqwest::Error> for MetricsError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self::UpstreamUnavailable {
            url,
            reason: err.to_string(),
        }
    }
}

/// Convenience type alias for Results in copilot-metrics
///
/// # Example
///
/// ```
/// use copilot_metrics_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, MetricsError>;
