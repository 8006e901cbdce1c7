//! Day range filtering
//!
//! # Examples
//!
//! ```
//! use copilot_metrics::filters::DayFilter;
//! use chrono::NaiveDate;
//!
//! // The last week of June 2024
//! let filter = DayFilter::new()
//!     .with_since(NaiveDate::from_ymd_opt(2024, 6, 24).unwrap())
//!     .with_until(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
//! assert!(filter.matches(NaiveDate::from_ymd_opt(2024, 6, 26).unwrap()));
//! ```

use chrono::NaiveDate;
use copilot_metrics_core::metrics::NormalizedDay;

/// Inclusive day range; an unset bound does not restrict
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DayFilter {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    pub fn with_until(mut self, date: NaiveDate) -> Self {
        self.until = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn matches(&self, day: NaiveDate) -> bool {
        if self.since.is_some_and(|since| day < since) {
            return false;
        }
        if self.until.is_some_and(|until| day > until) {
            return false;
        }
        true
    }

    /// Keep the days within range, preserving order
    pub fn apply(&self, days: Vec<NormalizedDay>) -> Vec<NormalizedDay> {
        if self.is_empty() {
            return days;
        }
        days.into_iter().filter(|d| self.matches(d.day)).collect()
    }
}
