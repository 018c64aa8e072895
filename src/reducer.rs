//! Reducer - pure function: (state, action) -> DispatchResult
//!
//! The search controller lives here: every input event, timer firing and
//! async result is one arm of the match below.

use tui_dispatch::{DataResource, DispatchResult};

use crate::action::{Action, NavKey};
use crate::effect::Effect;
use crate::signal::JumpSignal;
use crate::state::{AppState, DropdownMode, FocusArea, MAX_QUERY_LEN};

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.names = DataResource::Loading;
            state.history_auto_open = true;
            state.history_requested += 1;
            let mut effects = vec![
                Effect::LoadNames,
                Effect::LoadHistory {
                    generation: state.history_requested,
                },
            ];
            effects.extend(resolve_record(state));
            DispatchResult::changed_with_many(effects)
        }

        // ===== Search controller =====
        Action::SearchTextChange(text) => {
            if text == state.search.text {
                return DispatchResult::unchanged();
            }
            if text.chars().count() > MAX_QUERY_LEN {
                state.search.notice = true;
                state.search.notice_generation += 1;
                return DispatchResult::changed_with(Effect::ScheduleNoticeClear {
                    generation: state.search.notice_generation,
                });
            }
            state.search.text = text;
            state.search.selected_index = None;
            state.search.sync_generation += 1;
            state.search.dropdown = if state.search.text.trim().is_empty() {
                DropdownMode::Closed
            } else {
                suggestions_mode(state)
            };
            DispatchResult::changed_with(Effect::ScheduleQuerySync {
                generation: state.search.sync_generation,
            })
        }

        Action::SearchFocus => focus_search(state),

        Action::SearchBlur => blur_search(state),

        Action::SearchBlurDidElapse(token) => {
            if state.search.blur_pending != Some(token) {
                return DispatchResult::unchanged();
            }
            state.search.blur_pending = None;
            close_dropdown(state);
            DispatchResult::changed()
        }

        Action::SearchKey(key) => handle_nav_key(state, key),

        Action::SearchSuggestionClick(value) => commit(state, value),

        Action::SearchExternalJump(signal) => external_jump(state, signal),

        Action::SearchQuerySyncDidFire(generation) => {
            if generation != state.search.sync_generation {
                return DispatchResult::unchanged();
            }
            let query = state.search.text.trim().to_string();
            let mut effects = navigate(state, &query).unwrap_or_default();
            if !query.is_empty() {
                effects.push(record_history(state, query));
            }
            if effects.is_empty() {
                DispatchResult::unchanged()
            } else {
                DispatchResult::changed_with_many(effects)
            }
        }

        Action::SearchNoticeDidExpire(generation) => {
            if !state.search.notice || generation != state.search.notice_generation {
                return DispatchResult::unchanged();
            }
            state.search.notice = false;
            DispatchResult::changed()
        }

        // ===== Names =====
        Action::NamesDidLoad(names) => {
            state.names = DataResource::Loaded(names);
            match state.search.dropdown {
                DropdownMode::Closed
                    if state.search.is_focused && !state.search.text.trim().is_empty() =>
                {
                    state.search.dropdown = suggestions_mode(state);
                }
                DropdownMode::Suggestions => {
                    state.search.dropdown = suggestions_mode(state);
                    clamp_selection(state);
                }
                _ => {}
            }
            DispatchResult::changed()
        }

        Action::NamesDidError(error) => {
            state.names = DataResource::Failed(error);
            if state.search.dropdown == DropdownMode::Suggestions {
                close_dropdown(state);
            }
            DispatchResult::changed()
        }

        // ===== History =====
        Action::HistoryDidLoad {
            generation,
            entries,
        } => {
            let auto_open = std::mem::take(&mut state.history_auto_open);
            if generation <= state.history_applied {
                return DispatchResult::unchanged();
            }
            state.history_applied = generation;
            state.history = entries;
            let empty_text = state.search.text.trim().is_empty();
            match state.search.dropdown {
                DropdownMode::History if state.history.is_empty() => close_dropdown(state),
                DropdownMode::History => clamp_selection(state),
                DropdownMode::Closed
                    if auto_open
                        && state.search.is_focused
                        && empty_text
                        && !state.history.is_empty() =>
                {
                    state.search.dropdown = DropdownMode::History;
                }
                _ => {}
            }
            DispatchResult::changed()
        }

        // ===== Detail =====
        Action::DetailDidLoad { query, detail } => {
            match &detail {
                Some(found) => {
                    state.detail_cache.insert(query.clone(), found.clone());
                }
                None => {
                    state.detail_cache.remove(&query);
                }
            }
            if query != state.location.q {
                return DispatchResult::unchanged();
            }
            state.result = DataResource::Loaded(detail);
            state.revalidating = false;
            let evolutions = state.evolution_names().len();
            if state.evolution_selected >= evolutions {
                state.evolution_selected = 0;
            }
            match sprite_effect(state) {
                Some(effect) => DispatchResult::changed_with(effect),
                None => DispatchResult::changed(),
            }
        }

        Action::DetailDidError { query, error } => {
            if query != state.location.q {
                return DispatchResult::unchanged();
            }
            if state.revalidating && state.current_detail().is_some() {
                // Keep showing the cached copy.
                state.revalidating = false;
            } else {
                state.result = DataResource::Failed(error);
                state.revalidating = false;
            }
            DispatchResult::changed()
        }

        // ===== Sprite =====
        Action::SpriteDidLoad { url, sprite } => {
            state.sprite_cache.insert(url.clone(), sprite);
            if is_current_image(state, &url) {
                state.sprite_loading = false;
            }
            DispatchResult::changed()
        }

        Action::SpriteDidError { url, .. } => {
            if !is_current_image(state, &url) {
                return DispatchResult::unchanged();
            }
            state.sprite_loading = false;
            DispatchResult::changed()
        }

        // ===== Result view =====
        Action::ResultEvolutionSelect(index) => {
            if index < state.evolution_names().len() && index != state.evolution_selected {
                state.evolution_selected = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::NavigateBack => {
            let Some(previous) = state.location.go_back().map(str::to_string) else {
                return DispatchResult::unchanged();
            };
            state.search.text = previous;
            close_dropdown(state);
            state.search.sync_generation += 1;
            let mut effects = vec![Effect::CancelQuerySync];
            effects.extend(resolve_record(state));
            DispatchResult::changed_with_many(effects)
        }

        // ===== UI =====
        Action::UiFocusNext => match state.focus {
            FocusArea::Search => blur_search(state),
            FocusArea::Results => focus_search(state),
        },

        Action::Render => DispatchResult::changed(),

        Action::Quit => DispatchResult::unchanged(),
    }
}

// ============================================================================
// Search controller helpers
// ============================================================================

/// Suggestions mode when focused and there is something to suggest.
fn suggestions_mode(state: &AppState) -> DropdownMode {
    if state.search.is_focused && !state.suggestions().is_empty() {
        DropdownMode::Suggestions
    } else {
        DropdownMode::Closed
    }
}

fn close_dropdown(state: &mut AppState) {
    state.search.dropdown = DropdownMode::Closed;
    state.search.selected_index = None;
}

fn clamp_selection(state: &mut AppState) {
    let len = state.display_list().len();
    if state.search.selected_index.is_some_and(|index| index >= len) {
        state.search.selected_index = None;
    }
    if len == 0 {
        state.search.dropdown = DropdownMode::Closed;
    }
}

fn focus_search(state: &mut AppState) -> DispatchResult<Effect> {
    state.focus = FocusArea::Search;
    state.search.is_focused = true;
    let mut effects = Vec::new();
    if state.search.blur_pending.take().is_some() {
        effects.push(Effect::CancelBlurClose);
    }
    let previous = state.search.dropdown;
    if state.search.text.trim().is_empty() {
        state.search.dropdown = if state.history.is_empty() {
            DropdownMode::Closed
        } else {
            DropdownMode::History
        };
    } else if !state.suggestions().is_empty() {
        state.search.dropdown = DropdownMode::Suggestions;
    }
    if state.search.dropdown != previous {
        state.search.selected_index = None;
    }
    DispatchResult::changed_with_many(effects)
}

fn blur_search(state: &mut AppState) -> DispatchResult<Effect> {
    state.focus = FocusArea::Results;
    if !state.search.is_focused {
        return DispatchResult::changed();
    }
    state.search.is_focused = false;
    state.search.blur_generation += 1;
    let token = state.search.blur_generation;
    state.search.blur_pending = Some(token);
    DispatchResult::changed_with(Effect::ScheduleBlurClose { token })
}

fn handle_nav_key(state: &mut AppState, key: NavKey) -> DispatchResult<Effect> {
    let items = state.display_list();
    if state.search.dropdown == DropdownMode::Closed || items.is_empty() {
        return DispatchResult::unchanged();
    }
    let last = items.len() - 1;
    match key {
        NavKey::Down => {
            let next = match state.search.selected_index {
                Some(index) if index < last => index + 1,
                _ => 0,
            };
            state.search.selected_index = Some(next);
            DispatchResult::changed()
        }
        NavKey::Up => {
            let next = match state.search.selected_index {
                Some(index) if index > 0 && index <= last => index - 1,
                _ => last,
            };
            state.search.selected_index = Some(next);
            DispatchResult::changed()
        }
        NavKey::Enter => match state.search.selected_index.and_then(|index| items.get(index)) {
            Some(selected) => commit(state, selected.clone()),
            None => {
                let query = state.search.text.trim().to_string();
                if query.is_empty() {
                    return DispatchResult::unchanged();
                }
                close_dropdown(state);
                DispatchResult::changed_with(record_history(state, query))
            }
        },
        NavKey::Escape => {
            close_dropdown(state);
            DispatchResult::changed()
        }
    }
}

/// Finalize a pick: record it, close the dropdown and update the record
/// right away instead of waiting for the debounce.
fn commit(state: &mut AppState, value: String) -> DispatchResult<Effect> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return DispatchResult::unchanged();
    }
    state.search.text = value.clone();
    close_dropdown(state);
    state.search.sync_generation += 1;

    let mut effects = vec![Effect::CancelQuerySync];
    if state.search.blur_pending.take().is_some() {
        effects.push(Effect::CancelBlurClose);
    }
    effects.push(record_history(state, value.clone()));
    effects.extend(navigate(state, &value).unwrap_or_default());
    DispatchResult::changed_with_many(effects)
}

fn record_history(state: &mut AppState, query: String) -> Effect {
    state.history_requested += 1;
    Effect::RecordHistory {
        query,
        generation: state.history_requested,
    }
}

/// Set text and close in one step; never goes through the text-change path,
/// so nothing can reopen the dropdown afterwards.
fn external_jump(state: &mut AppState, signal: JumpSignal) -> DispatchResult<Effect> {
    let JumpSignal { name } = signal;
    state.search.text = name.clone();
    close_dropdown(state);
    state.search.is_focused = false;
    state.focus = FocusArea::Results;
    state.search.sync_generation += 1;

    let mut effects = vec![Effect::CancelQuerySync];
    if state.search.blur_pending.take().is_some() {
        effects.push(Effect::CancelBlurClose);
    }
    effects.extend(navigate(state, &name).unwrap_or_default());
    DispatchResult::changed_with_many(effects)
}

// ============================================================================
// Record / result helpers
// ============================================================================

/// Write the record. None when it already holds `query`.
fn navigate(state: &mut AppState, query: &str) -> Option<Vec<Effect>> {
    if !state.location.navigate(query) {
        return None;
    }
    Some(resolve_record(state))
}

fn is_current_image(state: &AppState, url: &str) -> bool {
    state
        .current_detail()
        .and_then(|detail| detail.image.as_deref())
        == Some(url)
}

/// Artwork fetch for the displayed detail, unless disabled or cached.
fn sprite_effect(state: &mut AppState) -> Option<Effect> {
    let url = state
        .current_detail()
        .and_then(|detail| detail.image.clone())
        .filter(|url| state.sprites_enabled && !state.sprite_cache.contains_key(url));
    state.sprite_loading = url.is_some();
    url.map(|url| Effect::LoadSprite { url })
}

/// Start resolving the detail for the current record: cached copy first,
/// network always.
fn resolve_record(state: &mut AppState) -> Vec<Effect> {
    let query = state.location.q.clone();
    state.evolution_selected = 0;
    state.sprite_loading = false;
    if query.is_empty() {
        state.result = DataResource::Empty;
        state.revalidating = false;
        return Vec::new();
    }
    match state.detail_cache.get(&query) {
        Some(cached) => {
            state.result = DataResource::Loaded(Some(cached.clone()));
            state.revalidating = true;
        }
        None => {
            state.result = DataResource::Loading;
            state.revalidating = false;
        }
    }
    vec![Effect::FetchDetail { query }]
}
