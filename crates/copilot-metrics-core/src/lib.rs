//! Core types, metrics model, configuration and errors for copilot-metrics
//!
//! This crate provides the raw usage payload types, the normalized metrics
//! model, the explicit application configuration and the error type shared
//! by the other copilot-metrics crates.

pub mod config;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::{AppConfig, Scope};
pub use error::{MetricsError, Result};
pub use metrics::{NormalizedDay, UsageTotals};
pub use parse::parse_raw_days;
pub use types::{RawBreakdownEntry, RawDailyRecord};
