//! Property-based tests for the normalization engine using proptest

mod common;

use chrono::NaiveDate;
use common::{TEST_EDITORS, TEST_LANGUAGES};
use copilot_metrics::aggregation::normalize;
use copilot_metrics::synthetic::{OsRandom, Synthetic};
use copilot_metrics_core::metrics::NormalizedDay;
use copilot_metrics_core::types::{RawBreakdownEntry, RawDailyRecord};
use proptest::prelude::*;

prop_compose! {
    fn arb_entry()(
        editor in prop::sample::select(TEST_EDITORS),
        language in prop::sample::select(TEST_LANGUAGES),
        users in 0i64..500,
        suggestions in 0i64..10_000,
        acceptances in 0i64..10_000,
        lines_suggested in 0i64..20_000,
        lines_accepted in 0i64..20_000,
    ) -> RawBreakdownEntry {
        RawBreakdownEntry {
            editor: editor.to_string(),
            language: language.to_string(),
            active_users: users,
            suggestions_count: suggestions,
            acceptances_count: acceptances,
            lines_suggested,
            lines_accepted,
        }
    }
}

prop_compose! {
    fn arb_day()(
        offset in 0u64..365,
        active in 0i64..1_000,
        chat in 0i64..1_000,
        breakdown in prop::collection::vec(arb_entry(), 0..30),
    ) -> RawDailyRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(offset);
        let mut record = RawDailyRecord::new(day, active, chat);
        record.breakdown = breakdown;
        record
    }
}

/// Order-insensitive view of a day: every counter keyed by its path
fn counters(day: &NormalizedDay) -> Vec<(String, [i64; 5])> {
    let mut out = vec![
        ("day".to_string(), [day.total_active_users, day.total_engaged_users, 0, 0, 0]),
    ];
    for editor in &day.copilot_ide_code_completions.editors {
        out.push((format!("code/{}", editor.name), [editor.total_engaged_users, 0, 0, 0, 0]));
        for model in &editor.models {
            out.push((format!("code/{}/{}", editor.name, model.name), [model.total_engaged_users, 0, 0, 0, 0]));
            for l in &model.languages {
                out.push((
                    format!("code/{}/{}/{}", editor.name, model.name, l.name),
                    [
                        l.total_engaged_users,
                        l.total_code_suggestions,
                        l.total_code_acceptances,
                        l.total_code_lines_suggested,
                        l.total_code_lines_accepted,
                    ],
                ));
            }
        }
    }
    for editor in &day.copilot_ide_chat.editors {
        for model in &editor.models {
            out.push((
                format!("chat/{}/{}", editor.name, model.name),
                [
                    editor.total_engaged_users,
                    model.total_engaged_users,
                    model.total_chats,
                    model.total_chat_insertion_events,
                    model.total_chat_copy_events,
                ],
            ));
        }
    }
    out.sort();
    out
}

proptest! {
    #[test]
    fn prop_one_output_per_input_in_order(days in prop::collection::vec(arb_day(), 0..10)) {
        let normalized = normalize(&days);
        prop_assert_eq!(normalized.len(), days.len());
        for (raw, day) in days.iter().zip(&normalized) {
            prop_assert_eq!(raw.day, day.day);
        }
    }

    #[test]
    fn prop_editor_totals_match_breakdown(raw in arb_day()) {
        let day = &normalize(std::slice::from_ref(&raw))[0];
        let expected: i64 = raw.breakdown.iter().filter(|e| !e.is_chat()).map(|e| e.active_users).sum();

        let editors: i64 = day.copilot_ide_code_completions.editors.iter().map(|e| e.total_engaged_users).sum();
        prop_assert_eq!(editors, expected);
        prop_assert_eq!(day.total_active_users, expected);
        prop_assert_eq!(day.copilot_ide_code_completions.total_engaged_users, expected);
        prop_assert_eq!(day.total_engaged_users, raw.total_active_users + raw.total_active_chat_users);
    }

    #[test]
    fn prop_chat_entries_never_in_code_completions(raw in arb_day()) {
        let day = &normalize(std::slice::from_ref(&raw))[0];
        for editor in &day.copilot_ide_code_completions.editors {
            for model in &editor.models {
                prop_assert!(model.languages.iter().all(|l| l.name != "unknown"));
            }
        }
        let chat_editors: std::collections::HashSet<_> =
            raw.breakdown.iter().filter(|e| e.is_chat()).map(|e| e.editor.as_str()).collect();
        prop_assert_eq!(day.copilot_ide_chat.editors.len(), chat_editors.len());

        let chats: i64 = raw.breakdown.iter().filter(|e| e.is_chat()).map(|e| e.suggestions_count).sum();
        prop_assert_eq!(day.chats(), chats);
    }

    #[test]
    fn prop_editor_names_unique(raw in arb_day()) {
        let day = &normalize(std::slice::from_ref(&raw))[0];
        let mut names: Vec<_> = day.copilot_ide_code_completions.editors.iter().map(|e| &e.name).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        prop_assert_eq!(names.len(), count);
    }

    #[test]
    fn prop_breakdown_order_does_not_change_totals(
        (raw, shuffled) in arb_day().prop_flat_map(|raw| {
            let breakdown = Just(raw.breakdown.clone()).prop_shuffle();
            (Just(raw), breakdown)
        })
    ) {
        let mut reordered = raw.clone();
        reordered.breakdown = shuffled;
        let a = &normalize(std::slice::from_ref(&raw))[0];
        let b = &normalize(std::slice::from_ref(&reordered))[0];
        prop_assert_eq!(counters(a), counters(b));
    }

    #[test]
    fn prop_synthetic_bounds(seed in any::<u64>()) {
        let mut synthetic = Synthetic::with_source(OsRandom::with_seed(seed));
        let chat = synthetic.chat();
        prop_assert!((10..=100).contains(&chat.total_engaged_users));
        let prs = synthetic.pull_requests();
        prop_assert!((0..=27).contains(&prs.total_engaged_users));
        let split: i64 = prs.repositories.iter().map(|r| r.total_engaged_users).sum();
        prop_assert_eq!(split, prs.total_engaged_users);
        prop_assert!(prs.repositories.iter().all(|r| r.total_engaged_users >= 1));
    }
}
