//! Normalization of raw Copilot usage into the metrics model
//!
//! Every raw day becomes exactly one [`NormalizedDay`], in input order.
//! Breakdown entries whose language is `"unknown"` are IDE chat activity;
//! everything else is code completion activity, grouped by editor and then
//! by language under a single `"default"` model.
//!
//! All merges are saturating summations, so the aggregate values of a day do not
//! depend on the order of its breakdown entries. Only the order of editors
//! and languages in the output lists follows first appearance.
//!
//! The github.com branches are not derived from the breakdown; they come
//! from a [`DotcomSource`].
//!
//! # Examples
//!
//! ```
//! use copilot_metrics::aggregation::normalize_json;
//!
//! let raw = r#"[{
//!     "day": "2024-06-24",
//!     "total_active_users": 5,
//!     "total_active_chat_users": 2,
//!     "breakdown": [
//!         {"editor": "vscode", "language": "python", "active_users": 5,
//!          "suggestions_count": 10, "acceptances_count": 3,
//!          "lines_suggested": 20, "lines_accepted": 6}
//!     ]
//! }]"#;
//!
//! let days = normalize_json(raw).unwrap();
//! assert_eq!(days[0].total_active_users, 5);
//! assert_eq!(days[0].total_engaged_users, 7);
//! ```

use copilot_metrics_core::error::Result;
use copilot_metrics_core::metrics::{
    ChatEditor, ChatModel, CodeCompletionEditor, CodeCompletionModel, DotcomChat,
    DotcomPullRequests, EditorAggregate, IdeChat, IdeCodeCompletions, LanguageAggregate,
    NormalizedDay,
};
use copilot_metrics_core::parse::parse_raw_days;
use copilot_metrics_core::types::{DEFAULT_MODEL, RawBreakdownEntry, RawDailyRecord};
use std::collections::HashMap;
use tracing::debug;

/// Supplies the github.com chat and pull request branches of a day
pub trait DotcomSource {
    fn dotcom_chat(&mut self, raw: &RawDailyRecord) -> DotcomChat;
    fn dotcom_pull_requests(&mut self, raw: &RawDailyRecord) -> DotcomPullRequests;
}

/// Copies the github.com branches from the raw payload, empty when absent
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl DotcomSource for Passthrough {
    fn dotcom_chat(&mut self, raw: &RawDailyRecord) -> DotcomChat {
        raw.copilot_dotcom_chat.clone().unwrap_or_default()
    }

    fn dotcom_pull_requests(&mut self, raw: &RawDailyRecord) -> DotcomPullRequests {
        raw.copilot_dotcom_pull_requests.clone().unwrap_or_default()
    }
}

/// Normalize raw days, passing github.com data through
pub fn normalize(raw_days: &[RawDailyRecord]) -> Vec<NormalizedDay> {
    normalize_with(raw_days, &mut Passthrough)
}

/// Normalize raw days with an explicit github.com data source
pub fn normalize_with<D: DotcomSource + ?Sized>(
    raw_days: &[RawDailyRecord],
    dotcom: &mut D,
) -> Vec<NormalizedDay> {
    let days: Vec<NormalizedDay> = raw_days
        .iter()
        .map(|raw| {
            let mut day = DayAccumulator::new(raw);
            for entry in &raw.breakdown {
                day.add_entry(entry);
            }
            day.into_normalized(dotcom.dotcom_chat(raw), dotcom.dotcom_pull_requests(raw))
        })
        .collect();
    debug!("Normalized {} days", days.len());
    days
}

/// Parse a raw JSON payload and normalize it
///
/// Fails without partial output if any day is malformed.
pub fn normalize_json(body: &str) -> Result<Vec<NormalizedDay>> {
    Ok(normalize(&parse_raw_days(body)?))
}

/// Parse a raw JSON payload and normalize it with an explicit github.com source
pub fn normalize_json_with<D: DotcomSource + ?Sized>(
    body: &str,
    dotcom: &mut D,
) -> Result<Vec<NormalizedDay>> {
    Ok(normalize_with(&parse_raw_days(body)?, dotcom))
}

/// Code completion editor plus a keyed index over its languages
struct CodeEditorSlot {
    editor: CodeCompletionEditor,
    languages: HashMap<String, usize>,
}

/// Working state for one day
struct DayAccumulator {
    day: chrono::NaiveDate,
    total_active_users: i64,
    total_engaged_users: i64,
    chat_users: i64,
    code_editors: Vec<CodeEditorSlot>,
    code_index: HashMap<String, usize>,
    chat_editors: Vec<ChatEditor>,
    chat_index: HashMap<String, usize>,
}

impl DayAccumulator {
    fn new(raw: &RawDailyRecord) -> Self {
        Self {
            day: raw.day,
            total_active_users: 0,
            total_engaged_users: raw.total_active_users.saturating_add(raw.total_active_chat_users),
            chat_users: raw.total_active_chat_users,
            code_editors: Vec::new(),
            code_index: HashMap::new(),
            chat_editors: Vec::new(),
            chat_index: HashMap::new(),
        }
    }

    fn add_entry(&mut self, entry: &RawBreakdownEntry) {
        if entry.is_chat() {
            self.add_chat(entry);
        } else {
            self.add_code_completion(entry);
        }
    }

    fn add_chat(&mut self, entry: &RawBreakdownEntry) {
        match self.chat_index.get(&entry.editor) {
            Some(&index) => {
                let editor = &mut self.chat_editors[index];
                bump(&mut editor.total_engaged_users, entry.active_users);
                if let Some(model) = editor.models.first_mut() {
                    bump(&mut model.total_engaged_users, entry.active_users);
                    bump(&mut model.total_chats, entry.suggestions_count);
                    bump(&mut model.total_chat_insertion_events, entry.acceptances_count);
                    bump(&mut model.total_chat_copy_events, entry.lines_accepted);
                }
            }
            None => {
                self.chat_index
                    .insert(entry.editor.clone(), self.chat_editors.len());
                self.chat_editors.push(EditorAggregate {
                    name: entry.editor.clone(),
                    total_engaged_users: entry.active_users,
                    models: vec![ChatModel {
                        name: DEFAULT_MODEL.to_string(),
                        is_custom_model: false,
                        custom_model_training_date: None,
                        total_engaged_users: entry.active_users,
                        total_chats: entry.suggestions_count,
                        total_chat_insertion_events: entry.acceptances_count,
                        // Copy events are reported as accepted lines upstream
                        total_chat_copy_events: entry.lines_accepted,
                    }],
                });
            }
        }
    }

    fn add_code_completion(&mut self, entry: &RawBreakdownEntry) {
        bump(&mut self.total_active_users, entry.active_users);

        let Some(&index) = self.code_index.get(&entry.editor) else {
            self.code_index
                .insert(entry.editor.clone(), self.code_editors.len());
            self.code_editors.push(CodeEditorSlot {
                editor: EditorAggregate {
                    name: entry.editor.clone(),
                    total_engaged_users: entry.active_users,
                    models: vec![CodeCompletionModel {
                        name: DEFAULT_MODEL.to_string(),
                        is_custom_model: false,
                        custom_model_training_date: None,
                        total_engaged_users: entry.active_users,
                        languages: vec![language_from(entry)],
                    }],
                },
                languages: HashMap::from([(entry.language.clone(), 0)]),
            });
            return;
        };

        let slot = &mut self.code_editors[index];
        bump(&mut slot.editor.total_engaged_users, entry.active_users);
        let Some(model) = slot.editor.models.first_mut() else {
            return;
        };
        bump(&mut model.total_engaged_users, entry.active_users);

        match slot.languages.get(&entry.language) {
            Some(&lang) => {
                let language = &mut model.languages[lang];
                bump(&mut language.total_engaged_users, entry.active_users);
                bump(&mut language.total_code_suggestions, entry.suggestions_count);
                bump(&mut language.total_code_acceptances, entry.acceptances_count);
                bump(&mut language.total_code_lines_suggested, entry.lines_suggested);
                bump(&mut language.total_code_lines_accepted, entry.lines_accepted);
            }
            None => {
                slot.languages
                    .insert(entry.language.clone(), model.languages.len());
                model.languages.push(language_from(entry));
            }
        }
    }

    /// Finish the day
    ///
    /// The code completion model total is the sum of every merged entry and
    /// the branch total equals the day's `total_active_users`. v2 payloads
    /// produced by the older converter instead keep the first entry's users on
    /// the model and report 0 for the branch, so those two fields differ from
    /// such fixtures.
    fn into_normalized(
        self,
        copilot_dotcom_chat: DotcomChat,
        copilot_dotcom_pull_requests: DotcomPullRequests,
    ) -> NormalizedDay {
        NormalizedDay {
            day: self.day,
            total_active_users: self.total_active_users,
            total_engaged_users: self.total_engaged_users,
            copilot_ide_code_completions: IdeCodeCompletions {
                total_engaged_users: self.total_active_users,
                editors: self.code_editors.into_iter().map(|s| s.editor).collect(),
            },
            copilot_ide_chat: IdeChat {
                total_engaged_users: self.chat_users,
                editors: self.chat_editors,
            },
            copilot_dotcom_chat,
            copilot_dotcom_pull_requests,
        }
    }
}

/// Counters clamp at the `i64` bounds
fn bump(counter: &mut i64, by: i64) {
    *counter = counter.saturating_add(by);
}

fn language_from(entry: &RawBreakdownEntry) -> LanguageAggregate {
    LanguageAggregate {
        name: entry.language.clone(),
        total_engaged_users: entry.active_users,
        total_code_suggestions: entry.suggestions_count,
        total_code_acceptances: entry.acceptances_count,
        total_code_lines_suggested: entry.lines_suggested,
        total_code_lines_accepted: entry.lines_accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_metrics_core::metrics::{DotcomChatModel, PullRequestRepository};
    use chrono::NaiveDate;

    fn entry(editor: &str, language: &str, users: i64, sug: i64, acc: i64, ls: i64, la: i64) -> RawBreakdownEntry {
        RawBreakdownEntry {
            editor: editor.to_string(),
            language: language.to_string(),
            active_users: users,
            suggestions_count: sug,
            acceptances_count: acc,
            lines_suggested: ls,
            lines_accepted: la,
        }
    }

    fn raw_day(active: i64, chat: i64, breakdown: Vec<RawBreakdownEntry>) -> RawDailyRecord {
        let mut raw = RawDailyRecord::new(NaiveDate::from_ymd_opt(2024, 6, 24).unwrap(), active, chat);
        raw.breakdown = breakdown;
        raw
    }

    #[test]
    fn test_same_editor_and_language_merge() {
        let raw = raw_day(
            7,
            0,
            vec![
                entry("vscode", "python", 5, 10, 3, 20, 6),
                entry("vscode", "python", 2, 4, 1, 8, 2),
            ],
        );
        let days = normalize(&[raw]);
        let day = &days[0];
        assert_eq!(day.total_active_users, 7);
        assert_eq!(day.copilot_ide_code_completions.total_engaged_users, 7);

        let editors = &day.copilot_ide_code_completions.editors;
        assert_eq!(editors.len(), 1);
        assert_eq!(editors[0].total_engaged_users, 7);
        let model = editors[0].model("default").unwrap();
        assert_eq!(model.total_engaged_users, 7);
        assert_eq!(model.languages.len(), 1);
        let python = model.language("python").unwrap();
        assert_eq!(
            (
                python.total_engaged_users,
                python.total_code_suggestions,
                python.total_code_acceptances,
                python.total_code_lines_suggested,
                python.total_code_lines_accepted
            ),
            (7, 14, 4, 28, 8)
        );
    }

    #[test]
    fn test_unknown_language_goes_to_chat() {
        let raw = raw_day(3, 3, vec![entry("vscode", "unknown", 3, 9, 2, 0, 4)]);
        let day = &normalize(&[raw])[0];

        assert!(day.copilot_ide_code_completions.editors.is_empty());
        assert_eq!(day.total_active_users, 0);
        assert_eq!(day.total_engaged_users, 6);
        assert_eq!(day.copilot_ide_chat.total_engaged_users, 3);

        let editor = &day.copilot_ide_chat.editors[0];
        assert_eq!(editor.name, "vscode");
        assert_eq!(editor.total_engaged_users, 3);
        let model = editor.model("default").unwrap();
        assert_eq!(model.total_chats, 9);
        assert_eq!(model.total_chat_insertion_events, 2);
        assert_eq!(model.total_chat_copy_events, 4);
    }

    #[test]
    fn test_chat_entries_for_same_editor_accumulate() {
        let raw = raw_day(
            0,
            5,
            vec![
                entry("vscode", "unknown", 3, 9, 2, 0, 4),
                entry("jetbrains", "unknown", 1, 1, 0, 0, 0),
                entry("vscode", "unknown", 2, 5, 1, 0, 1),
            ],
        );
        let day = &normalize(&[raw])[0];
        let editors = &day.copilot_ide_chat.editors;
        assert_eq!(editors.len(), 2);
        assert_eq!(editors[0].name, "vscode");
        assert_eq!(editors[0].total_engaged_users, 5);
        let model = &editors[0].models[0];
        assert_eq!(
            (
                model.total_engaged_users,
                model.total_chats,
                model.total_chat_insertion_events,
                model.total_chat_copy_events
            ),
            (5, 14, 3, 5)
        );
    }

    #[test]
    fn test_first_seen_order() {
        let raw = raw_day(
            0,
            0,
            vec![
                entry("jetbrains", "java", 1, 1, 1, 1, 1),
                entry("vscode", "rust", 1, 1, 1, 1, 1),
                entry("jetbrains", "kotlin", 1, 1, 1, 1, 1),
                entry("vscode", "go", 1, 1, 1, 1, 1),
                entry("jetbrains", "java", 1, 1, 1, 1, 1),
            ],
        );
        let day = &normalize(&[raw])[0];
        let editors: Vec<_> = day
            .copilot_ide_code_completions
            .editors
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(editors, ["jetbrains", "vscode"]);
        let languages: Vec<_> = day.copilot_ide_code_completions.editors[0].models[0]
            .languages
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(languages, ["java", "kotlin"]);
        assert_eq!(day.total_active_users, 5);
    }

    #[test]
    fn test_empty_breakdown() {
        let day = &normalize(&[raw_day(4, 1, Vec::new())])[0];
        assert_eq!(day.total_active_users, 0);
        assert_eq!(day.total_engaged_users, 5);
        assert!(day.copilot_ide_code_completions.editors.is_empty());
        assert!(day.copilot_ide_chat.editors.is_empty());
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_passthrough_dotcom() {
        let mut raw = raw_day(1, 0, Vec::new());
        let day = &normalize(std::slice::from_ref(&raw))[0];
        assert_eq!(day.copilot_dotcom_chat, DotcomChat::default());
        assert_eq!(day.copilot_dotcom_pull_requests, DotcomPullRequests::default());

        raw.copilot_dotcom_chat = Some(DotcomChat {
            total_engaged_users: 12,
            models: vec![DotcomChatModel {
                name: "default".to_string(),
                is_custom_model: false,
                custom_model_training_date: None,
                total_engaged_users: 12,
                total_chats: 40,
            }],
        });
        raw.copilot_dotcom_pull_requests = Some(DotcomPullRequests {
            total_engaged_users: 2,
            repositories: vec![PullRequestRepository {
                name: "demo/repo-5001".to_string(),
                total_engaged_users: 2,
                models: Vec::new(),
            }],
        });
        let day = &normalize(std::slice::from_ref(&raw))[0];
        assert_eq!(day.copilot_dotcom_chat.models[0].total_chats, 40);
        assert_eq!(day.copilot_dotcom_pull_requests.repositories.len(), 1);
    }

    #[test]
    fn test_normalize_json_rejects_malformed_batch() {
        let body = r#"[
            {"day": "2024-06-24", "total_active_users": 1, "total_active_chat_users": 0, "breakdown": []},
            {"day": "2024-06-25", "total_active_users": 1, "total_active_chat_users": 0,
             "breakdown": [{"editor": "vscode", "language": "go"}]}
        ]"#;
        let err = normalize_json(body).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("day 1"));
        assert!(message.contains("breakdown[0]"));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = vec![raw_day(2, 1, vec![entry("vscode", "go", 2, 3, 1, 4, 1)])];
        let before = raw.clone();
        let _ = normalize(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let raw = raw_day(
            i64::MAX,
            1,
            vec![
                entry("vscode", "python", i64::MAX, i64::MAX, 1, 1, 1),
                entry("vscode", "python", i64::MAX, 1, 1, 1, 1),
                entry("vscode", "unknown", i64::MAX, 3, 0, 0, 0),
                entry("vscode", "unknown", 1, 3, 0, 0, 0),
            ],
        );
        let day = &normalize(&[raw])[0];
        assert_eq!(day.total_engaged_users, i64::MAX);
        assert_eq!(day.total_active_users, i64::MAX);

        let model = day.copilot_ide_code_completions.editors[0].model("default").unwrap();
        assert_eq!(model.total_engaged_users, i64::MAX);
        assert_eq!(model.language("python").unwrap().total_code_suggestions, i64::MAX);
        assert_eq!(day.copilot_ide_chat.editors[0].total_engaged_users, i64::MAX);
        assert_eq!(day.chats(), 6);
    }
}
