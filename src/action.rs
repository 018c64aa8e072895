//! Actions: user intents, timer firings and async results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;
use crate::signal::JumpSignal;
use crate::sprite::SpriteData;
use crate::state::PokemonDetail;

/// Dropdown navigation keys handled by the search controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    /// Load names and history, resolve the initial location
    Init,

    // ===== Search category =====
    /// Input text changed (full new value)
    SearchTextChange(String),

    /// Input gained focus
    SearchFocus,

    /// Input lost focus; closes the dropdown after a grace period
    SearchBlur,

    /// Dropdown navigation key
    SearchKey(NavKey),

    /// Pick a dropdown item directly
    SearchSuggestionClick(String),

    /// Another component asked to navigate to a name
    SearchExternalJump(JumpSignal),

    /// Timer: debounce window elapsed for the given generation
    SearchQuerySyncDidFire(u64),

    /// Timer: blur grace elapsed for the given token
    SearchBlurDidElapse(u64),

    /// Timer: "limit reached" notice expired for the given generation
    SearchNoticeDidExpire(u64),

    // ===== Names category =====
    NamesDidLoad(Vec<String>),
    NamesDidError(String),

    // ===== History category =====
    /// Snapshot of the store; older generations than the last applied one
    /// are dropped
    HistoryDidLoad {
        generation: u64,
        entries: Vec<HistoryEntry>,
    },

    // ===== Detail category =====
    DetailDidLoad {
        query: String,
        detail: Option<PokemonDetail>,
    },
    DetailDidError {
        query: String,
        error: String,
    },

    // ===== Sprite category =====
    SpriteDidLoad {
        url: String,
        sprite: SpriteData,
    },
    SpriteDidError {
        url: String,
        error: String,
    },

    // ===== Result category =====
    /// Highlight an evolution in the result view
    ResultEvolutionSelect(usize),

    // ===== Navigation =====
    NavigateBack,

    // ===== UI category =====
    UiFocusNext,

    /// Force a re-render (cursor movement)
    Render,

    Quit,
}
