//! Output formatting for copilot-metrics
//!
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output
//!
//! # Examples
//!
//! ```
//! use copilot_metrics::aggregation::normalize;
//! use copilot_metrics::output::get_formatter;
//! use copilot_metrics_core::metrics::UsageTotals;
//!
//! let days = normalize(&[]);
//! let totals = UsageTotals::from_days(&days);
//!
//! let formatter = get_formatter(false);
//! assert!(formatter.format_usage(&days, &totals).contains("TOTAL"));
//!
//! let json_formatter = get_formatter(true);
//! assert!(json_formatter.format_usage(&days, &totals).contains("\"days\""));
//! ```

use colored::Colorize;
use copilot_metrics_core::metrics::{NormalizedDay, UsageTotals};
use copilot_metrics_github::client::Organization;
use prettytable::{Cell, Row, Table, format, row};
use serde_json::json;

/// Renders command results
pub trait OutputFormatter {
    /// Daily usage with a totals row
    fn format_usage(&self, days: &[NormalizedDay], totals: &UsageTotals) -> String;

    fn format_organizations(&self, orgs: &[Organization]) -> String;

    fn format_teams(&self, teams: &[String]) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: i64) -> String {
        let digits = n.unsigned_abs().to_string();
        let mut result = String::new();
        for (count, ch) in digits.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }
        if n < 0 {
            result.push('-');
        }
        result.chars().rev().collect()
    }

    fn format_rate(rate: f64) -> String {
        format!("{rate:.1}%")
    }

    fn format_totals_row(totals: &UsageTotals) -> Row {
        row![
            b -> "TOTAL",
            b -> Self::format_number(totals.total_active_users),
            b -> Self::format_number(totals.total_engaged_users),
            b -> Self::format_number(totals.code_suggestions),
            b -> Self::format_number(totals.code_acceptances),
            b -> Self::format_rate(totals.acceptance_rate()),
            b -> Self::format_number(totals.code_lines_accepted),
            b -> Self::format_number(totals.chat_users),
            b -> Self::format_number(totals.chats)
        ]
    }
}

impl OutputFormatter for TableFormatter {
    fn format_usage(&self, days: &[NormalizedDay], totals: &UsageTotals) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Day",
            b -> "Active",
            b -> "Engaged",
            b -> "Suggestions",
            b -> "Acceptances",
            b -> "Rate",
            b -> "Lines Accepted",
            b -> "Chat Users",
            b -> "Chats"
        ]);

        for day in days {
            table.add_row(row![
                day.day.format("%Y-%m-%d"),
                r -> Self::format_number(day.total_active_users),
                r -> Self::format_number(day.total_engaged_users),
                r -> Self::format_number(day.code_suggestions()),
                r -> Self::format_number(day.code_acceptances()),
                r -> Self::format_rate(day.acceptance_rate()),
                r -> Self::format_number(day.code_lines_accepted()),
                r -> Self::format_number(day.copilot_ide_chat.total_engaged_users),
                r -> Self::format_number(day.chats())
            ]);
        }

        table.add_row(Row::new(vec![Cell::new(""); 9]));
        table.add_row(Self::format_totals_row(totals));

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n{} days, acceptance rate {}\n",
            totals.days,
            Self::format_rate(totals.acceptance_rate()).as_str().bold()
        ));
        output
    }

    fn format_organizations(&self, orgs: &[Organization]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Login", b -> "Description"]);
        for org in orgs {
            table.add_row(row![org.login, org.description]);
        }
        table.to_string()
    }

    fn format_teams(&self, teams: &[String]) -> String {
        if teams.is_empty() {
            return format!("{}\n", "No teams found".yellow());
        }
        let mut output = String::new();
        for team in teams {
            output.push_str(team);
            output.push('\n');
        }
        output
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty(value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_default()
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_usage(&self, days: &[NormalizedDay], totals: &UsageTotals) -> String {
        Self::pretty(&json!({
            "days": days,
            "totals": totals,
        }))
    }

    fn format_organizations(&self, orgs: &[Organization]) -> String {
        Self::pretty(&json!(orgs))
    }

    fn format_teams(&self, teams: &[String]) -> String {
        Self::pretty(&json!(teams))
    }
}

/// Pick the formatter for the requested output mode
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
