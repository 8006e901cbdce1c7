//! Normalized metrics model
//!
//! Pure data structures produced by the normalization engine. The JSON field
//! names are the v2 Copilot metrics contract shared with existing fixtures
//! and consumers, so they must not be renamed.
//!
//! Editors are generic over their model shape: IDE code completion editors
//! carry [`CodeCompletionModel`]s with per-language counters, IDE chat
//! editors carry [`ChatModel`]s with chat counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized metrics for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDay {
    /// Calendar day
    pub day: NaiveDate,
    /// Sum of active users over code completion breakdown entries
    pub total_active_users: i64,
    /// Active users plus chat users as reported for the day
    pub total_engaged_users: i64,
    /// IDE code completion activity
    pub copilot_ide_code_completions: IdeCodeCompletions,
    /// IDE chat activity
    pub copilot_ide_chat: IdeChat,
    /// github.com chat activity
    pub copilot_dotcom_chat: DotcomChat,
    /// github.com pull request summary activity
    pub copilot_dotcom_pull_requests: DotcomPullRequests,
}

/// IDE code completion branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeCodeCompletions {
    pub total_engaged_users: i64,
    pub editors: Vec<CodeCompletionEditor>,
}

/// IDE chat branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdeChat {
    pub total_engaged_users: i64,
    pub editors: Vec<ChatEditor>,
}

/// Activity of one editor within a branch
///
/// Editor names are unique within a branch of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorAggregate<M> {
    pub name: String,
    pub total_engaged_users: i64,
    pub models: Vec<M>,
}

/// Editor in the IDE code completion branch
pub type CodeCompletionEditor = EditorAggregate<CodeCompletionModel>;

/// Editor in the IDE chat branch
pub type ChatEditor = EditorAggregate<ChatModel>;

impl<M> EditorAggregate<M> {
    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&M>
    where
        M: Named,
    {
        self.models.iter().find(|m| m.name() == name)
    }
}

/// Anything identified by a name inside its parent list
pub trait Named {
    fn name(&self) -> &str;
}

/// Code completion model with its language breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCompletionModel {
    pub name: String,
    pub is_custom_model: bool,
    pub custom_model_training_date: Option<String>,
    pub total_engaged_users: i64,
    pub languages: Vec<LanguageAggregate>,
}

impl CodeCompletionModel {
    /// Look up a language by name
    pub fn language(&self, name: &str) -> Option<&LanguageAggregate> {
        self.languages.iter().find(|l| l.name == name)
    }
}

impl Named for CodeCompletionModel {
    fn name(&self) -> &str {
        &self.name
    }
}

/// IDE chat model counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatModel {
    pub name: String,
    pub is_custom_model: bool,
    pub custom_model_training_date: Option<String>,
    pub total_engaged_users: i64,
    pub total_chats: i64,
    pub total_chat_insertion_events: i64,
    pub total_chat_copy_events: i64,
}

impl Named for ChatModel {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Code completion counters for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageAggregate {
    pub name: String,
    pub total_engaged_users: i64,
    pub total_code_suggestions: i64,
    pub total_code_acceptances: i64,
    pub total_code_lines_suggested: i64,
    pub total_code_lines_accepted: i64,
}

/// github.com chat branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DotcomChat {
    pub total_engaged_users: i64,
    pub models: Vec<DotcomChatModel>,
}

/// github.com chat model counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotcomChatModel {
    pub name: String,
    pub is_custom_model: bool,
    pub custom_model_training_date: Option<String>,
    pub total_engaged_users: i64,
    pub total_chats: i64,
}

/// github.com pull request summary branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DotcomPullRequests {
    pub total_engaged_users: i64,
    pub repositories: Vec<PullRequestRepository>,
}

/// Pull request summary activity in one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRepository {
    pub name: String,
    pub total_engaged_users: i64,
    pub models: Vec<PullRequestModel>,
}

/// Pull request summary model counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestModel {
    pub name: String,
    pub is_custom_model: bool,
    pub custom_model_training_date: Option<String>,
    pub total_pr_summaries_created: i64,
    pub total_engaged_users: i64,
}

impl NormalizedDay {
    fn languages(&self) -> impl Iterator<Item = &LanguageAggregate> {
        self.copilot_ide_code_completions
            .editors
            .iter()
            .flat_map(|e| e.models.iter())
            .flat_map(|m| m.languages.iter())
    }

    fn chat_models(&self) -> impl Iterator<Item = &ChatModel> {
        self.copilot_ide_chat
            .editors
            .iter()
            .flat_map(|e| e.models.iter())
    }

    /// Code suggestions across all editors and languages
    pub fn code_suggestions(&self) -> i64 {
        saturating_sum(self.languages().map(|l| l.total_code_suggestions))
    }

    /// Code acceptances across all editors and languages
    pub fn code_acceptances(&self) -> i64 {
        saturating_sum(self.languages().map(|l| l.total_code_acceptances))
    }

    /// Lines suggested across all editors and languages
    pub fn code_lines_suggested(&self) -> i64 {
        saturating_sum(self.languages().map(|l| l.total_code_lines_suggested))
    }

    /// Lines accepted across all editors and languages
    pub fn code_lines_accepted(&self) -> i64 {
        saturating_sum(self.languages().map(|l| l.total_code_lines_accepted))
    }

    /// IDE chat turns across all editors
    pub fn chats(&self) -> i64 {
        saturating_sum(self.chat_models().map(|m| m.total_chats))
    }

    /// IDE chat insertion events across all editors
    pub fn chat_insertion_events(&self) -> i64 {
        saturating_sum(self.chat_models().map(|m| m.total_chat_insertion_events))
    }

    /// IDE chat copy events across all editors
    pub fn chat_copy_events(&self) -> i64 {
        saturating_sum(self.chat_models().map(|m| m.total_chat_copy_events))
    }

    /// Acceptance rate in percent, 0 when nothing was suggested
    pub fn acceptance_rate(&self) -> f64 {
        percentage(self.code_acceptances(), self.code_suggestions())
    }
}

/// Sum that clamps at the `i64` bounds instead of overflowing
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Totals across a batch of normalized days
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub days: usize,
    pub total_active_users: i64,
    pub total_engaged_users: i64,
    pub code_suggestions: i64,
    pub code_acceptances: i64,
    pub code_lines_suggested: i64,
    pub code_lines_accepted: i64,
    pub chat_users: i64,
    pub chats: i64,
    pub chat_insertion_events: i64,
    pub chat_copy_events: i64,
}

impl UsageTotals {
    pub fn from_days(days: &[NormalizedDay]) -> Self {
        let mut totals = Self::default();
        for day in days {
            totals.days += 1;
            totals.total_active_users = totals.total_active_users.saturating_add(day.total_active_users);
            totals.total_engaged_users = totals.total_engaged_users.saturating_add(day.total_engaged_users);
            totals.code_suggestions = totals.code_suggestions.saturating_add(day.code_suggestions());
            totals.code_acceptances = totals.code_acceptances.saturating_add(day.code_acceptances());
            totals.code_lines_suggested = totals.code_lines_suggested.saturating_add(day.code_lines_suggested());
            totals.code_lines_accepted = totals.code_lines_accepted.saturating_add(day.code_lines_accepted());
            totals.chat_users = totals.chat_users.saturating_add(day.copilot_ide_chat.total_engaged_users);
            totals.chats = totals.chats.saturating_add(day.chats());
            totals.chat_insertion_events = totals.chat_insertion_events.saturating_add(day.chat_insertion_events());
            totals.chat_copy_events = totals.chat_copy_events.saturating_add(day.chat_copy_events());
        }
        totals
    }

    /// Acceptance rate over the whole batch in percent
    pub fn acceptance_rate(&self) -> f64 {
        percentage(self.code_acceptances, self.code_suggestions)
    }
}
