//! Raw usage payload types
//!
//! These types mirror the daily records returned by the GitHub
//! `copilot/usage` endpoints. They are the input of the normalization
//! engine and are never mutated by it.

use crate::metrics::{DotcomChat, DotcomPullRequests};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel language marking a breakdown entry as IDE chat activity
pub const CHAT_LANGUAGE: &str = "unknown";

/// Name of the synthetic model every breakdown entry is attributed to
pub const DEFAULT_MODEL: &str = "default";

/// One day of raw usage as returned by the API
///
/// # Examples
/// ```
/// use copilot_metrics_core::types::RawDailyRecord;
///
/// let json = r#"{
///     "day": "2024-06-24",
///     "total_active_users": 12,
///     "total_active_chat_users": 4,
///     "breakdown": []
/// }"#;
/// let record: RawDailyRecord = serde_json::from_str(json).unwrap();
/// assert_eq!(record.total_active_users, 12);
/// assert!(record.breakdown.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDailyRecord {
    /// Calendar day the record covers
    pub day: NaiveDate,
    /// Users active in any Copilot feature that day
    pub total_active_users: i64,
    /// Users active in IDE chat that day
    pub total_active_chat_users: i64,
    /// Per-editor, per-language activity
    pub breakdown: Vec<RawBreakdownEntry>,
    /// Dotcom chat block, passed through untouched when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copilot_dotcom_chat: Option<DotcomChat>,
    /// Dotcom pull request block, passed through untouched when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copilot_dotcom_pull_requests: Option<DotcomPullRequests>,
}

impl RawDailyRecord {
    /// Create a record with an empty breakdown
    pub fn new(day: NaiveDate, total_active_users: i64, total_active_chat_users: i64) -> Self {
        Self {
            day,
            total_active_users,
            total_active_chat_users,
            breakdown: Vec::new(),
            copilot_dotcom_chat: None,
            copilot_dotcom_pull_requests: None,
        }
    }
}

/// One editor/language slice of a day's activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBreakdownEntry {
    /// Editor identifier (e.g. `vscode`, `jetbrains`)
    pub editor: String,
    /// Language name, or [`CHAT_LANGUAGE`] for chat activity
    pub language: String,
    /// Users active for this editor/language
    pub active_users: i64,
    /// Suggestions shown (chat turns for chat entries)
    pub suggestions_count: i64,
    /// Suggestions accepted (chat insertions for chat entries)
    pub acceptances_count: i64,
    /// Lines suggested; chat entries may omit it
    #[serde(default)]
    pub lines_suggested: i64,
    /// Lines accepted (chat copy events for chat entries)
    pub lines_accepted: i64,
}

impl RawBreakdownEntry {
    /// Whether this entry describes chat activity rather than completions
    pub fn is_chat(&self) -> bool {
        self.language == CHAT_LANGUAGE
    }
}
