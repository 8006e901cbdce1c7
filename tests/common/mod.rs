//! Common test utilities and helpers for copilot-metrics tests
//!
//! Builders for raw usage days and breakdown entries, plus a scripted
//! random source for the synthetic generator.

#![allow(dead_code)]

use chrono::NaiveDate;
use copilot_metrics::synthetic::RandomSource;
use copilot_metrics_core::types::{RawBreakdownEntry, RawDailyRecord};
use std::collections::VecDeque;

/// Editors used across tests
pub const TEST_EDITORS: &[&str] = &["vscode", "jetbrains", "neovim", "visualstudio"];

/// Languages used across tests; `unknown` marks chat activity
pub const TEST_LANGUAGES: &[&str] = &["python", "rust", "typescript", "go", "unknown"];

/// Builder for breakdown entries
pub struct EntryBuilder {
    entry: RawBreakdownEntry,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            entry: RawBreakdownEntry {
                editor: "vscode".to_string(),
                language: "python".to_string(),
                active_users: 1,
                suggestions_count: 0,
                acceptances_count: 0,
                lines_suggested: 0,
                lines_accepted: 0,
            },
        }
    }

    pub fn editor(mut self, editor: &str) -> Self {
        self.entry.editor = editor.to_string();
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.entry.language = language.to_string();
        self
    }

    pub fn chat(self) -> Self {
        self.language("unknown")
    }

    pub fn users(mut self, users: i64) -> Self {
        self.entry.active_users = users;
        self
    }

    /// Suggestions, acceptances, lines suggested, lines accepted
    pub fn counts(mut self, suggestions: i64, acceptances: i64, lines_suggested: i64, lines_accepted: i64) -> Self {
        self.entry.suggestions_count = suggestions;
        self.entry.acceptances_count = acceptances;
        self.entry.lines_suggested = lines_suggested;
        self.entry.lines_accepted = lines_accepted;
        self
    }

    pub fn build(self) -> RawBreakdownEntry {
        self.entry
    }
}

/// Builder for raw days
pub struct DayBuilder {
    record: RawDailyRecord,
}

impl DayBuilder {
    pub fn new(date: &str) -> Self {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid test date");
        Self {
            record: RawDailyRecord::new(day, 0, 0),
        }
    }

    pub fn active(mut self, users: i64) -> Self {
        self.record.total_active_users = users;
        self
    }

    pub fn chat_users(mut self, users: i64) -> Self {
        self.record.total_active_chat_users = users;
        self
    }

    pub fn entry(mut self, entry: RawBreakdownEntry) -> Self {
        self.record.breakdown.push(entry);
        self
    }

    pub fn build(self) -> RawDailyRecord {
        self.record
    }
}

/// Replays fixed values, then answers the lower bound
pub struct ScriptedRandom {
    values: VecDeque<i64>,
}

impl ScriptedRandom {
    pub fn new(values: &[i64]) -> Self {
        Self {
            values: values.iter().copied().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn int_in(&mut self, min: i64, _max: i64) -> i64 {
        self.values.pop_front().unwrap_or(min)
    }
}

/// Raw payload of one day as JSON text
pub fn raw_json(days: &[RawDailyRecord]) -> String {
    serde_json::to_string(days).expect("raw days serialize")
}
