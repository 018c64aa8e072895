//! Search controller scenarios
//!
//! Effects are resolved by a small in-process driver: timers are keyed
//! last-write-wins slots fired by hand, history goes to a memory store.

use std::collections::VecDeque;

use pokesearch::{
    action::{Action, NavKey},
    effect::Effect,
    history::{HistoryEntry, HistoryStore, MemoryHistoryStore},
    location::QueryLocation,
    reducer::reducer,
    signal::JumpSignal,
    state::{AppState, DropdownMode, NOTICE_CLEAR_MS, PokemonDetail},
};
use pretty_assertions::assert_eq;
use tui_dispatch::testing::*;

/// Store plus a stand-in for the effect handler in main
struct Driver {
    state: AppState,
    universe: Vec<String>,
    history: MemoryHistoryStore,
    fetched: Vec<String>,
    query_sync: Option<u64>,
    blur_close: Option<u64>,
    notice_clear: Option<u64>,
}

impl Driver {
    fn new(universe: &[&str]) -> Self {
        Self {
            state: AppState::default(),
            universe: universe.iter().map(|name| name.to_string()).collect(),
            history: MemoryHistoryStore::new(),
            fetched: Vec::new(),
            query_sync: None,
            blur_close: None,
            notice_clear: None,
        }
    }

    fn with_history(mut self, queries: &[&str]) -> Self {
        let entries = queries
            .iter()
            .map(|query| HistoryEntry {
                query: query.to_string(),
                timestamp: chrono::Utc::now(),
            })
            .collect();
        self.history = MemoryHistoryStore::with_entries(entries);
        self
    }

    fn started(mut self) -> Self {
        self.dispatch(Action::Init);
        self
    }

    fn apply(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::LoadNames => Some(Action::NamesDidLoad(self.universe.clone())),
            Effect::LoadHistory { generation } => Some(Action::HistoryDidLoad {
                generation,
                entries: self.history.get_all(),
            }),
            Effect::RecordHistory { query, generation } => {
                self.history.add(&query);
                Some(Action::HistoryDidLoad {
                    generation,
                    entries: self.history.get_all(),
                })
            }
            Effect::FetchDetail { query } => {
                self.fetched.push(query);
                None
            }
            Effect::ScheduleQuerySync { generation } => {
                self.query_sync = Some(generation);
                None
            }
            Effect::CancelQuerySync => {
                self.query_sync = None;
                None
            }
            Effect::ScheduleBlurClose { token } => {
                self.blur_close = Some(token);
                None
            }
            Effect::CancelBlurClose => {
                self.blur_close = None;
                None
            }
            Effect::LoadSprite { .. } => None,
            Effect::ScheduleNoticeClear { generation } => {
                self.notice_clear = Some(generation);
                None
            }
        }
    }

    /// Dispatch and resolve effects until quiet. Returns whether the first
    /// action changed state.
    fn dispatch(&mut self, action: Action) -> bool {
        let mut queue = VecDeque::from([action]);
        let mut first_changed = None;
        while let Some(action) = queue.pop_front() {
            let result = reducer(&mut self.state, action);
            first_changed.get_or_insert(result.changed);
            for effect in result.effects {
                if let Some(next) = self.apply(effect) {
                    queue.push_back(next);
                }
            }
        }
        first_changed.unwrap_or(false)
    }

    fn type_text(&mut self, text: &str) {
        let mut typed = String::new();
        for ch in text.chars() {
            typed.push(ch);
            self.dispatch(Action::SearchTextChange(typed.clone()));
        }
    }

    fn fire_query_sync(&mut self) {
        if let Some(generation) = self.query_sync.take() {
            self.dispatch(Action::SearchQuerySyncDidFire(generation));
        }
    }

    fn fire_blur_close(&mut self) {
        if let Some(token) = self.blur_close.take() {
            self.dispatch(Action::SearchBlurDidElapse(token));
        }
    }

    fn fire_notice_clear(&mut self) {
        if let Some(generation) = self.notice_clear.take() {
            self.dispatch(Action::SearchNoticeDidExpire(generation));
        }
    }

    fn history_queries(&self) -> Vec<String> {
        self.history
            .get_all()
            .into_iter()
            .map(|entry| entry.query)
            .collect()
    }
}

const KANTO: &[&str] = &["Bulbasaur", "Charmander", "Squirtle"];

// ============================================================================
// Debounced query sync
// ============================================================================

#[test]
fn test_debounce_updates_record_once() {
    let mut app = Driver::new(KANTO).started();

    app.type_text("char");
    assert_eq!(app.state.location.q, "");

    app.fire_query_sync();
    assert_eq!(app.state.location.q, "char");
    assert_eq!(app.state.location.back.len(), 1);
    assert_eq!(app.fetched, vec!["char"]);

    // No second timer is pending
    app.fire_query_sync();
    assert_eq!(app.fetched, vec!["char"]);
}

#[test]
fn test_debounce_records_trimmed_text_to_history() {
    let mut app = Driver::new(KANTO).started();

    app.type_text("char ");
    assert!(app.history_queries().is_empty());

    app.fire_query_sync();
    assert_eq!(app.state.location.q, "char");
    assert_eq!(app.history_queries(), vec!["char"]);
    assert_eq!(app.state.history_queries(), vec!["char"]);
}

#[test]
fn test_debounce_on_blank_text_records_nothing() {
    let mut app = Driver::new(KANTO).started();
    app.type_text("a");
    app.dispatch(Action::SearchTextChange("  ".into()));
    app.fire_query_sync();

    assert_eq!(app.state.location.q, "");
    assert!(app.history_queries().is_empty());
}

#[test]
fn test_debounce_coalesces_bursts() {
    let mut app = Driver::new(KANTO).started();

    app.type_text("char");
    app.dispatch(Action::SearchTextChange("charm".into()));
    app.fire_query_sync();

    assert_eq!(app.state.location.q, "charm");
    assert_eq!(app.state.location.back, vec![String::new()]);
    assert_eq!(app.fetched, vec!["charm"]);
}

#[test]
fn test_superseded_timer_firing_is_ignored() {
    let mut app = Driver::new(KANTO).started();

    app.dispatch(Action::SearchTextChange("sq".into()));
    let stale = app.query_sync.expect("sync scheduled");
    app.dispatch(Action::SearchTextChange("squ".into()));

    assert!(!app.dispatch(Action::SearchQuerySyncDidFire(stale)));
    assert_eq!(app.state.location.q, "");
    assert!(app.fetched.is_empty());
}

// ============================================================================
// Suggestions and commit
// ============================================================================

#[test]
fn test_typing_prefix_then_picking_suggestion() {
    let mut app = Driver::new(KANTO).started();

    app.type_text("ch");
    assert_eq!(app.state.search.dropdown, DropdownMode::Suggestions);
    assert_eq!(app.state.display_list(), vec!["Charmander"]);

    app.dispatch(Action::SearchKey(NavKey::Down));
    assert_eq!(app.state.search.selected_index, Some(0));
    app.dispatch(Action::SearchKey(NavKey::Enter));

    assert_eq!(app.state.location.q, "Charmander");
    assert_eq!(app.state.search.text, "Charmander");
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
    assert_eq!(app.state.search.selected_index, None);
    assert_eq!(app.state.history_queries(), vec!["Charmander"]);
    assert_eq!(app.history_queries(), vec!["Charmander"]);
    assert_eq!(app.fetched, vec!["Charmander"]);
    // The commit cancelled the pending debounce
    assert_eq!(app.query_sync, None);
}

#[test]
fn test_enter_and_click_commit_identically() {
    let mut via_enter = Driver::new(KANTO).with_history(&["Eevee"]).started();
    via_enter.type_text("s");
    via_enter.dispatch(Action::SearchKey(NavKey::Down));
    via_enter.dispatch(Action::SearchKey(NavKey::Enter));

    let mut via_click = Driver::new(KANTO).with_history(&["Eevee"]).started();
    via_click.type_text("s");
    via_click.dispatch(Action::SearchSuggestionClick("Squirtle".into()));

    assert_eq!(via_enter.state.location, via_click.state.location);
    assert_eq!(via_enter.history_queries(), via_click.history_queries());
    assert_eq!(via_enter.fetched, via_click.fetched);
    assert_eq!(via_enter.history_queries(), vec!["Squirtle", "Eevee"]);
    assert_eq!(
        via_click.state.location,
        QueryLocation {
            q: "Squirtle".into(),
            back: vec![String::new()],
        }
    );
}

#[test]
fn test_enter_without_selection_records_text() {
    let mut app = Driver::new(KANTO).started();

    app.type_text("bul");
    app.dispatch(Action::SearchKey(NavKey::Enter));

    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
    assert_eq!(app.history_queries(), vec!["bul"]);
    // The record still follows the debounce path
    assert_eq!(app.state.location.q, "");
    app.fire_query_sync();
    assert_eq!(app.state.location.q, "bul");
}

#[test]
fn test_arrow_navigation_wraps() {
    let mut app = Driver::new(&["Pidgey", "Pidgeotto", "Pidgeot", "Pikachu"]).started();
    app.type_text("pidg");
    assert_eq!(app.state.display_list().len(), 3);

    app.dispatch(Action::SearchKey(NavKey::Up));
    assert_eq!(app.state.search.selected_index, Some(2));
    app.dispatch(Action::SearchKey(NavKey::Down));
    assert_eq!(app.state.search.selected_index, Some(0));
    app.dispatch(Action::SearchKey(NavKey::Up));
    assert_eq!(app.state.search.selected_index, Some(2));

    app.dispatch(Action::SearchKey(NavKey::Escape));
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
    assert_eq!(app.state.search.text, "pidg");

    // Keys are no-ops while closed
    assert!(!app.dispatch(Action::SearchKey(NavKey::Down)));
}

// ============================================================================
// History fallback and blur
// ============================================================================

#[test]
fn test_focus_on_empty_input_shows_history() {
    let mut app = Driver::new(KANTO)
        .with_history(&["pikachu", "eevee"])
        .started();

    app.dispatch(Action::SearchBlur);
    app.fire_blur_close();
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);

    app.dispatch(Action::SearchFocus);
    assert_eq!(app.state.search.dropdown, DropdownMode::History);
    assert_eq!(app.state.display_list(), vec!["pikachu", "eevee"]);
}

#[test]
fn test_history_pick_commits_like_a_suggestion() {
    let mut app = Driver::new(KANTO)
        .with_history(&["pikachu", "eevee"])
        .started();
    assert_eq!(app.state.search.dropdown, DropdownMode::History);

    app.dispatch(Action::SearchKey(NavKey::Up));
    app.dispatch(Action::SearchKey(NavKey::Enter));

    assert_eq!(app.state.location.q, "eevee");
    assert_eq!(app.history_queries(), vec!["eevee", "pikachu"]);
}

#[test]
fn test_late_history_snapshot_does_not_reopen_dropdown() {
    let mut app = Driver::new(KANTO)
        .with_history(&["pikachu"])
        .started();
    app.dispatch(Action::SearchKey(NavKey::Escape));
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);

    // A record finishing after Escape refreshes the list only
    app.dispatch(Action::HistoryDidLoad {
        generation: app.state.history_requested + 1,
        entries: app.history.get_all(),
    });
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
    assert_eq!(app.state.history_queries(), vec!["pikachu"]);
}

#[test]
fn test_refocus_within_grace_keeps_dropdown() {
    let mut app = Driver::new(KANTO).started();
    app.type_text("b");

    app.dispatch(Action::SearchBlur);
    let stale = app.blur_close.expect("blur close scheduled");
    app.dispatch(Action::SearchFocus);
    assert_eq!(app.blur_close, None);

    assert!(!app.dispatch(Action::SearchBlurDidElapse(stale)));
    assert_eq!(app.state.search.dropdown, DropdownMode::Suggestions);
}

#[test]
fn test_pick_during_blur_grace_lands() {
    let mut app = Driver::new(KANTO).started();
    app.type_text("b");
    app.dispatch(Action::SearchBlur);

    app.dispatch(Action::SearchSuggestionClick("Bulbasaur".into()));
    assert_eq!(app.blur_close, None);
    assert_eq!(app.state.location.q, "Bulbasaur");
}

// ============================================================================
// External jump
// ============================================================================

#[test]
fn test_external_jump_closes_suggestions_without_reopening() {
    let mut app = Driver::new(&["Ivysaur", "Bulbasaur", "Venusaur"]).started();
    app.type_text("i");
    assert_eq!(app.state.search.dropdown, DropdownMode::Suggestions);

    let signal = JumpSignal::new("Ivysaur").expect("non-blank");
    app.dispatch(Action::SearchExternalJump(signal));

    assert_eq!(app.state.search.text, "Ivysaur");
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
    assert_eq!(app.state.location.q, "Ivysaur");
    assert_eq!(app.query_sync, None);
    assert!(app.history_queries().is_empty());

    // A late name list does not reopen the dropdown either
    app.dispatch(Action::NamesDidLoad(vec!["Ivysaur".into()]));
    assert_eq!(app.state.search.dropdown, DropdownMode::Closed);
}

#[test]
fn test_jump_uses_cached_detail_then_revalidates() {
    let mut app = Driver::new(KANTO).started();
    app.dispatch(Action::DetailDidLoad {
        query: "Ivysaur".into(),
        detail: Some(PokemonDetail {
            name: "Ivysaur".into(),
            ..Default::default()
        }),
    });

    let signal = JumpSignal::from_payload(&serde_json::json!({ "name": "Ivysaur" }));
    app.dispatch(Action::SearchExternalJump(signal.expect("string name")));

    assert!(app.state.revalidating);
    assert_eq!(
        app.state.current_detail().map(|d| d.name.as_str()),
        Some("Ivysaur")
    );
    assert_eq!(app.fetched, vec!["Ivysaur"]);
}

#[test]
fn test_non_string_payload_dispatches_nothing() {
    assert!(JumpSignal::from_payload(&serde_json::json!({ "name": 2 })).is_none());
    assert!(JumpSignal::from_payload(&serde_json::json!(null)).is_none());
}

// ============================================================================
// Input limit
// ============================================================================

#[test]
fn test_input_over_limit_is_rejected_with_notice() {
    let mut app = Driver::new(KANTO).started();
    let fifty = "a".repeat(50);

    app.dispatch(Action::SearchTextChange(fifty.clone()));
    app.dispatch(Action::SearchTextChange("a".repeat(51)));

    assert_eq!(app.state.search.text, fifty);
    assert!(app.state.search.notice);
    assert!((2000..=3000).contains(&NOTICE_CLEAR_MS));

    app.fire_notice_clear();
    assert!(!app.state.search.notice);
}

// ============================================================================
// EffectStoreTestHarness flows
// ============================================================================

#[test]
fn test_name_list_failure_keeps_typing_alive() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::Init);
    harness.assert_state(|s| s.names.is_loading());
    let effects = harness.drain_effects();
    effects.effects_count(2);
    effects.effects_first_matches(|e| matches!(e, Effect::LoadNames));

    harness.complete_action(Action::NamesDidError("offline".into()));
    harness.process_emitted();
    harness.assert_state(|s| s.names_failed());

    harness.dispatch_collect(Action::SearchTextChange("pika".into()));
    harness.assert_state(|s| s.search.text == "pika");
    harness.assert_state(|s| s.search.dropdown == DropdownMode::Closed);

    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| matches!(e, Effect::ScheduleQuerySync { .. }));
}

#[test]
fn test_stale_detail_does_not_replace_current_result() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::SearchSuggestionClick("Bulbasaur".into()));
    harness.dispatch_collect(Action::SearchSuggestionClick("Squirtle".into()));
    let effects = harness.drain_effects();
    effects.effects_all_match(|e| !matches!(e, Effect::ScheduleQuerySync { .. }));

    harness.complete_action(Action::DetailDidLoad {
        query: "Bulbasaur".into(),
        detail: Some(PokemonDetail {
            name: "Bulbasaur".into(),
            ..Default::default()
        }),
    });
    harness.process_emitted();
    harness.assert_state(|s| s.result.is_loading());
    harness.assert_state(|s| s.detail_cache.contains_key("Bulbasaur"));

    harness.complete_action(Action::DetailDidLoad {
        query: "Squirtle".into(),
        detail: None,
    });
    harness.process_emitted();
    harness.assert_state(|s| s.result.is_loaded() && s.current_detail().is_none());
}
