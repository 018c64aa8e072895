//! Application state - single source of truth

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;

use crate::history::HistoryEntry;
use crate::location::QueryLocation;
use crate::sprite::SpriteData;
use crate::suggest;

/// Delay before typed text becomes the query-string-of-record.
pub const QUERY_SYNC_DEBOUNCE_MS: u64 = 350;
/// Grace period after blur so a pending pick on the dropdown still lands.
pub const BLUR_GRACE_MS: u64 = 150;
/// How long the "limit reached" notice stays visible.
pub const NOTICE_CLEAR_MS: u64 = 2000;
/// Maximum accepted input length, in characters.
pub const MAX_QUERY_LEN: usize = 50;
/// Size of the name universe requested from the data source.
pub const NAME_UNIVERSE_SIZE: usize = 151;

// ============================================================================
// Pokemon data
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Attack {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub damage: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Attacks {
    #[serde(default)]
    pub fast: Vec<Attack>,
    #[serde(default)]
    pub special: Vec<Attack>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SizeRange {
    pub minimum: Option<String>,
    pub maximum: Option<String>,
}

impl SizeRange {
    pub fn label(&self) -> Option<String> {
        match (self.minimum.as_deref(), self.maximum.as_deref()) {
            (None, None) => None,
            (min, max) => Some(format!("{} - {}", min.unwrap_or("?"), max.unwrap_or("?"))),
        }
    }
}

/// Evolution entry as returned alongside a detail. The name is optional
/// upstream, so a stub may not be navigable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvolutionStub {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetail {
    pub name: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub resistant: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub weight: Option<SizeRange>,
    #[serde(default)]
    pub height: Option<SizeRange>,
    #[serde(default)]
    pub attacks: Attacks,
    #[serde(default)]
    pub evolutions: Vec<EvolutionStub>,
    /// Artwork URL
    #[serde(default)]
    pub image: Option<String>,
}

// ============================================================================
// Search controller state
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DropdownMode {
    #[default]
    Closed,
    Suggestions,
    History,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FocusArea {
    #[default]
    Search,
    Results,
}

/// Input, dropdown and timer bookkeeping owned by the search controller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SearchState {
    pub text: String,
    pub selected_index: Option<usize>,
    pub dropdown: DropdownMode,
    pub is_focused: bool,

    /// Bumped on every text change and commit; a debounce firing with an
    /// older value is stale.
    pub sync_generation: u64,
    /// Token of the pending blur-close, if any.
    pub blur_pending: Option<u64>,
    pub blur_generation: u64,

    /// "Limit reached" notice.
    pub notice: bool,
    pub notice_generation: u64,
}

// ============================================================================
// App state
// ============================================================================

/// Application state - everything the UI needs to render
#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    #[debug(section = "Search", label = "Input", debug_fmt)]
    pub search: SearchState,

    /// Known-name universe used for suggestions
    #[debug(skip)]
    pub names: DataResource<Vec<String>>,

    #[debug(section = "Search", label = "History", debug_fmt)]
    pub history: Vec<HistoryEntry>,

    /// Last history snapshot generation requested / applied
    #[debug(skip)]
    pub history_requested: u64,
    #[debug(skip)]
    pub history_applied: u64,

    /// Set by Init: the first history snapshot may open the dropdown
    #[debug(skip)]
    pub history_auto_open: bool,

    /// Query-string-of-record plus back stack
    #[debug(section = "Location", label = "Record", debug_fmt)]
    pub location: QueryLocation,

    /// Detail for the current record: Loaded(None) means no such Pokemon
    #[debug(section = "Result", label = "Detail", debug_fmt)]
    pub result: DataResource<Option<PokemonDetail>>,

    /// A cached detail is shown while the network copy is refetched
    #[debug(section = "Result", label = "Revalidating")]
    pub revalidating: bool,

    #[debug(skip)]
    pub detail_cache: HashMap<String, PokemonDetail>,

    #[debug(section = "Result", label = "Evolution", debug_fmt)]
    pub evolution_selected: usize,

    /// Decoded artwork keyed by image URL
    #[debug(skip)]
    pub sprite_cache: HashMap<String, SpriteData>,
    #[debug(section = "Result", label = "Sprite loading")]
    pub sprite_loading: bool,
    #[debug(section = "Result", label = "Sprites")]
    pub sprites_enabled: bool,

    #[debug(section = "Focus", label = "Area", debug_fmt)]
    pub focus: FocusArea,
}

impl AppState {
    /// Create state whose input and record both start at `location`.
    pub fn new(location: QueryLocation) -> Self {
        let search = SearchState {
            text: location.q.clone(),
            is_focused: true,
            ..Default::default()
        };
        Self {
            search,
            names: DataResource::Empty,
            history: Vec::new(),
            history_requested: 0,
            history_applied: 0,
            history_auto_open: false,
            location,
            result: DataResource::Empty,
            revalidating: false,
            detail_cache: HashMap::new(),
            evolution_selected: 0,
            sprite_cache: HashMap::new(),
            sprite_loading: false,
            sprites_enabled: true,
            focus: FocusArea::Search,
        }
    }

    pub fn known_names(&self) -> &[String] {
        self.names.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn suggestions(&self) -> Vec<String> {
        suggest::suggestions(&self.search.text, self.known_names())
    }

    pub fn history_queries(&self) -> Vec<String> {
        self.history.iter().map(|entry| entry.query.clone()).collect()
    }

    /// Items visible in the dropdown for the current mode.
    pub fn display_list(&self) -> Vec<String> {
        match self.search.dropdown {
            DropdownMode::Closed => Vec::new(),
            DropdownMode::Suggestions => self.suggestions(),
            DropdownMode::History => self.history_queries(),
        }
    }

    pub fn current_detail(&self) -> Option<&PokemonDetail> {
        self.result.data().and_then(Option::as_ref)
    }

    /// Evolutions of the displayed detail that can be jumped to.
    pub fn evolution_names(&self) -> Vec<String> {
        self.current_detail()
            .map(|detail| {
                detail
                    .evolutions
                    .iter()
                    .filter_map(|stub| stub.name.clone())
                    .filter(|name| !name.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decoded artwork for the displayed detail, if any.
    pub fn current_sprite(&self) -> Option<&SpriteData> {
        let url = self.current_detail()?.image.as_ref()?;
        self.sprite_cache.get(url)
    }

    pub fn names_loading(&self) -> bool {
        self.names.is_loading()
    }

    pub fn names_failed(&self) -> bool {
        self.names.is_failed()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(QueryLocation::default())
    }
}
