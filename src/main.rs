//! pokesearch - Pokemon search TUI

use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout, Rect},
};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokesearch::action::Action;
use pokesearch::api::{self, GraphqlSource};
use pokesearch::components::{
    AddressBar, AddressBarProps, Component, ResultView, ResultViewProps, SEARCH_BAR_HEIGHT,
    SearchBar, SearchBarProps,
};
use pokesearch::effect::Effect;
use pokesearch::fixture::FixtureSource;
use pokesearch::history::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
use pokesearch::location::QueryLocation;
use pokesearch::reducer::reducer;
use pokesearch::source::PokemonDataSource;
use pokesearch::sprite::decode_sprite;
use pokesearch::sprite_backend::{self, SpriteBackend};
use pokesearch::state::{
    AppState, BLUR_GRACE_MS, FocusArea, NAME_UNIVERSE_SIZE, NOTICE_CLEAR_MS,
    QUERY_SYNC_DEBOUNCE_MS,
};

/// Pokemon search with autocomplete, history and a shareable query location
#[derive(Parser, Debug)]
#[command(name = "pokesearch")]
#[command(about = "Search the Pokemon GraphQL API from the terminal")]
struct Args {
    /// Initial query
    #[arg(long, short)]
    query: Option<String>,

    /// Initial location, e.g. "/?q=Mr.%20Mime"
    #[arg(long, conflicts_with = "query")]
    location: Option<String>,

    /// GraphQL endpoint
    #[arg(long, default_value = api::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Serve names and details from a RON fixture instead of the network
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Skip the on-disk response cache
    #[arg(long)]
    no_cache: bool,

    /// Do not fetch or draw artwork
    #[arg(long)]
    no_sprites: bool,

    /// History file (defaults to the platform data dir)
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long, conflicts_with = "history_file")]
    no_history: bool,

    /// Write debug logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum SearchComponentId {
    Search,
    Results,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum SearchContext {
    Search,
    Results,
}

impl EventRoutingState<SearchComponentId, SearchContext> for AppState {
    fn focused(&self) -> Option<SearchComponentId> {
        match self.focus {
            FocusArea::Search => Some(SearchComponentId::Search),
            FocusArea::Results => Some(SearchComponentId::Results),
        }
    }

    fn modal(&self) -> Option<SearchComponentId> {
        None
    }

    fn binding_context(&self, id: SearchComponentId) -> SearchContext {
        match id {
            SearchComponentId::Search => SearchContext::Search,
            SearchComponentId::Results => SearchContext::Results,
        }
    }

    fn default_context(&self) -> SearchContext {
        SearchContext::Search
    }
}

/// Collaborators the effect handler talks to
struct Services {
    source: Arc<dyn PokemonDataSource>,
    history: Arc<dyn HistoryStore>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        query,
        location,
        endpoint,
        fixture,
        no_cache,
        no_sprites,
        history_file,
        no_history,
        log_file,
        debug: debug_args,
    } = Args::parse();

    init_logging(log_file.as_deref())?;

    let debug = DebugSession::new(debug_args);

    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let source: Arc<dyn PokemonDataSource> = match fixture {
        Some(path) => match FixtureSource::load(&path).await {
            Ok(source) => Arc::new(source),
            Err(e) => {
                eprintln!("Error: could not load fixture {}", path.display());
                eprintln!("Details: {}", e);
                std::process::exit(1);
            }
        },
        None if no_cache => Arc::new(GraphqlSource::new(endpoint).without_disk_cache()),
        None => Arc::new(GraphqlSource::new(endpoint)),
    };
    let history: Arc<dyn HistoryStore> = if no_history {
        Arc::new(MemoryHistoryStore::new())
    } else {
        let path = history_file.unwrap_or_else(JsonHistoryStore::default_path);
        tracing::debug!(path = %path.display(), "using history file");
        Arc::new(JsonHistoryStore::new(path))
    };
    let services = Arc::new(Services { source, history });

    let initial = match (query, location) {
        (Some(query), _) => QueryLocation::new(query),
        (None, Some(location)) => QueryLocation::parse(&location),
        (None, None) => QueryLocation::default(),
    };
    let mut state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(initial))
        })
        .await
        .map_err(debug_error)?;
    state.sprites_enabled = !no_sprites;

    let replay_actions = debug.load_replay_items().map_err(debug_error)?;

    let (middleware, action_recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = SpriteBackend::new(stdout, sprite_backend::sprite_slot());
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, services).await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug
        .save_actions(action_recorder.as_ref())
        .map_err(debug_error)?;

    Ok(())
}

fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

struct SearchUi {
    address: AddressBar,
    search: SearchBar,
    results: ResultView,
    status_bar: StatusBar,
}

impl SearchUi {
    fn new() -> Self {
        Self {
            address: AddressBar,
            search: SearchBar::new(),
            results: ResultView::new(),
            status_bar: StatusBar::new(),
        }
    }

    fn search_props<'a>(
        state: &'a AppState,
        items: &'a [String],
        is_focused: bool,
    ) -> SearchBarProps<'a> {
        SearchBarProps {
            search: &state.search,
            items,
            names_loading: state.names_loading(),
            names_failed: state.names_failed(),
            is_focused,
            on_change: Action::SearchTextChange,
            on_key: Action::SearchKey,
            on_pick: Action::SearchSuggestionClick,
        }
    }

    fn result_props(state: &AppState, is_focused: bool) -> ResultViewProps<'_> {
        ResultViewProps {
            state,
            is_focused,
            show_sprite: state.sprites_enabled && state.display_list().is_empty(),
            on_select: Action::ResultEvolutionSelect,
            on_jump: Action::SearchExternalJump,
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<SearchComponentId>,
    ) {
        let chunks = Layout::vertical([
            Constraint::Length(1),                 // Address line
            Constraint::Length(SEARCH_BAR_HEIGHT), // Search bar
            Constraint::Min(3),                    // Result
            Constraint::Length(1),                 // Help bar
        ])
        .split(area);

        self.address.render(
            frame,
            chunks[0],
            AddressBarProps {
                location: &state.location,
            },
        );

        event_ctx.set_component_area(SearchComponentId::Results, chunks[2]);
        let results_focused = render_ctx.is_focused() && state.focus == FocusArea::Results;
        self.results
            .render(frame, chunks[2], Self::result_props(state, results_focused));

        // The dropdown overlays the top of the result pane
        let search_area = Rect {
            height: chunks[1].height + chunks[2].height,
            ..chunks[1]
        };
        event_ctx.set_component_area(SearchComponentId::Search, chunks[1]);
        let items = state.display_list();
        let search_focused = render_ctx.is_focused() && state.search.is_focused;
        self.search.render(
            frame,
            search_area,
            Self::search_props(state, &items, search_focused),
        );

        <StatusBar as Component<Action>>::render(
            &mut self.status_bar,
            frame,
            chunks[3],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&[
                    StatusBarHint::new("tab", "focus"),
                    StatusBarHint::new("\u{2191}\u{2193}", "select"),
                    StatusBarHint::new("enter", "open"),
                    StatusBarHint::new("alt+\u{2190}", "back"),
                    StatusBarHint::new("ctrl+c", "quit"),
                ]),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }

    fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let items = state.display_list();
        let props = Self::search_props(state, &items, true);
        let actions: Vec<_> = self.search.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    fn handle_results_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = Self::result_props(state, true);
        let actions: Vec<_> = self
            .results
            .handle_event(event, props)
            .into_iter()
            .collect();
        handler_response(actions)
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    services: Arc<Services>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(SearchUi::new()));
    let mut bus: EventBus<AppState, Action, SearchComponentId, SearchContext> = EventBus::new();
    let keybindings: Keybindings<SearchContext> = Keybindings::new();

    let ui_search = Rc::clone(&ui);
    bus.register(SearchComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_results = Rc::clone(&ui);
    bus.register(SearchComponentId::Results, move |event, state| {
        ui_results
            .borrow_mut()
            .handle_results_event(&event.kind, state)
    });

    bus.register_global(|event, _state| match event.kind {
        EventKind::Resize(_, _) => HandlerResponse::ignored().with_render(),
        EventKind::Key(key) => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                HandlerResponse::action(Action::Quit)
            }
            KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => {
                HandlerResponse::action(Action::NavigateBack)
            }
            KeyCode::Tab | KeyCode::BackTab => HandlerResponse::action(Action::UiFocusNext),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |_runtime| {},
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &services),
        )
        .await
}

/// Handle effects by spawning tasks
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, services: &Services) {
    match effect {
        Effect::LoadNames => {
            let source = Arc::clone(&services.source);
            ctx.tasks().spawn(TaskKey::new("names"), async move {
                match source.list_names(NAME_UNIVERSE_SIZE).await {
                    Ok(names) => Action::NamesDidLoad(names),
                    Err(e) => {
                        tracing::warn!("name list fetch failed: {e}");
                        Action::NamesDidError(e.to_string())
                    }
                }
            });
        }
        Effect::LoadHistory { generation } => {
            let history = Arc::clone(&services.history);
            ctx.tasks().spawn(TaskKey::new("history_load"), async move {
                let entries = tokio::task::spawn_blocking(move || history.get_all())
                    .await
                    .unwrap_or_default();
                Action::HistoryDidLoad {
                    generation,
                    entries,
                }
            });
        }
        Effect::RecordHistory { query, generation } => {
            let history = Arc::clone(&services.history);
            let key = format!("history_record_{generation}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                let entries = tokio::task::spawn_blocking(move || {
                    history.add(&query);
                    history.get_all()
                })
                .await
                .unwrap_or_default();
                Action::HistoryDidLoad {
                    generation,
                    entries,
                }
            });
        }
        Effect::FetchDetail { query } => {
            let source = Arc::clone(&services.source);
            let key = format!("detail_{query}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match source.get_by_name(&query).await {
                    Ok(detail) => Action::DetailDidLoad { query, detail },
                    Err(e) => {
                        tracing::warn!(query = %query, "detail fetch failed: {e}");
                        Action::DetailDidError {
                            query,
                            error: e.to_string(),
                        }
                    }
                }
            });
        }
        Effect::LoadSprite { url } => {
            let source = Arc::clone(&services.source);
            let key = format!("sprite_{url}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                let decoded = match source.get_image(&url).await {
                    Ok(bytes) => tokio::task::spawn_blocking(move || decode_sprite(&bytes))
                        .await
                        .unwrap_or_else(|e| Err(e.to_string())),
                    Err(e) => Err(e.to_string()),
                };
                match decoded {
                    Ok(sprite) => Action::SpriteDidLoad { url, sprite },
                    Err(error) => {
                        tracing::debug!(url = %url, "artwork unavailable: {error}");
                        Action::SpriteDidError { url, error }
                    }
                }
            });
        }
        Effect::ScheduleQuerySync { generation } => {
            ctx.tasks().debounce(
                "query_sync",
                Duration::from_millis(QUERY_SYNC_DEBOUNCE_MS),
                async move { Action::SearchQuerySyncDidFire(generation) },
            );
        }
        Effect::CancelQuerySync => {
            ctx.tasks().cancel(&TaskKey::new("query_sync"));
        }
        Effect::ScheduleBlurClose { token } => {
            ctx.tasks().debounce(
                "blur_close",
                Duration::from_millis(BLUR_GRACE_MS),
                async move { Action::SearchBlurDidElapse(token) },
            );
        }
        Effect::CancelBlurClose => {
            ctx.tasks().cancel(&TaskKey::new("blur_close"));
        }
        Effect::ScheduleNoticeClear { generation } => {
            ctx.tasks().debounce(
                "notice_clear",
                Duration::from_millis(NOTICE_CLEAR_MS),
                async move { Action::SearchNoticeDidExpire(generation) },
            );
        }
    }
}
