use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle,
};

use super::Component;
use crate::action::Action;
use crate::signal::JumpSignal;
use crate::sprite::{kitty_sequence, sprite_fit};
use crate::sprite_backend;
use crate::state::{Attack, AppState, PokemonDetail};

const LABEL: Style = Style::new().fg(Color::DarkGray);
/// Rows reserved for artwork above the detail text
const SPRITE_ROWS: u16 = 8;

/// Detail pane for the query-string-of-record
#[derive(Default)]
pub struct ResultView {
    evolutions: SelectList,
}

pub struct ResultViewProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
    /// Artwork is drawn over the cells, so it is hidden under overlays
    pub show_sprite: bool,
    pub on_select: fn(usize) -> Action,
    /// Evolution activation; the search controller handles the navigation
    pub on_jump: fn(JumpSignal) -> Action,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    fn jump_targets(state: &AppState) -> Vec<JumpSignal> {
        state
            .current_detail()
            .map(|detail| {
                detail
                    .evolutions
                    .iter()
                    .filter_map(JumpSignal::from_stub)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn evolution_items(state: &AppState) -> Vec<Line<'static>> {
        let Some(detail) = state.current_detail() else {
            return Vec::new();
        };
        detail
            .evolutions
            .iter()
            .filter_map(|stub| JumpSignal::from_stub(stub).map(|signal| (signal, stub)))
            .enumerate()
            .map(|(idx, (signal, stub))| {
                let mut spans = vec![Span::raw(format!("{:02} {}", idx + 1, signal.name))];
                if !stub.types.is_empty() {
                    spans.push(Span::styled(format!("  {}", stub.types.join(", ")), LABEL));
                }
                Line::from(spans)
            })
            .collect()
    }

    fn list_style() -> SelectListStyle {
        SelectListStyle {
            base: BaseStyle {
                border: None,
                padding: Padding::xy(1, 0),
                bg: None,
                fg: None,
            },
            selection: SelectionStyle {
                style: Some(
                    Style::default()
                        .bg(Color::Rgb(60, 60, 90))
                        .add_modifier(Modifier::BOLD),
                ),
                marker: None,
                disabled: false,
            },
            ..SelectListStyle::default()
        }
    }

    fn message(text: String, color: Color) -> Paragraph<'static> {
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    }

    fn render_sprite(frame: &mut Frame, area: Rect, state: &AppState) {
        if let Some(sprite) = state.current_sprite() {
            let (cols, rows) = sprite_fit(sprite, area.width, area.height);
            if let Ok(sequence) = kitty_sequence(sprite, cols, rows) {
                let x = area.x + area.width.saturating_sub(cols) / 2;
                let y = area.y + area.height.saturating_sub(rows) / 2;
                sprite_backend::update_sprite(x, y, sequence);
            }
            return;
        }
        let placeholder = if state.sprite_loading {
            "[loading artwork]"
        } else {
            "[no artwork]"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(placeholder, LABEL)).alignment(Alignment::Center),
            Rect {
                y: area.y + area.height / 2,
                height: 1.min(area.height),
                ..area
            },
        );
    }

    fn detail_lines(detail: &PokemonDetail) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let mut heading = Vec::new();
        if let Some(number) = &detail.number {
            heading.push(Span::styled(format!("#{number} "), LABEL));
        }
        heading.push(Span::styled(
            detail.name.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        if let Some(classification) = &detail.classification {
            heading.push(Span::styled(format!("  {classification}"), LABEL));
        }
        lines.push(Line::from(heading));
        lines.push(Line::default());

        for (label, values) in [
            ("Types", &detail.types),
            ("Resistant", &detail.resistant),
            ("Weaknesses", &detail.weaknesses),
        ] {
            if !values.is_empty() {
                lines.push(field(label, values.join(", ")));
            }
        }
        if let Some(weight) = detail.weight.as_ref().and_then(|range| range.label()) {
            lines.push(field("Weight", weight));
        }
        if let Some(height) = detail.height.as_ref().and_then(|range| range.label()) {
            lines.push(field("Height", height));
        }

        if detail.attacks.fast.is_empty() && detail.attacks.special.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("No attacks available", LABEL)));
        }
        for (label, attacks) in [
            ("Fast attacks", &detail.attacks.fast),
            ("Special attacks", &detail.attacks.special),
        ] {
            if attacks.is_empty() {
                continue;
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                label,
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(attacks.iter().map(attack_line));
        }
        lines
    }
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<11}"), LABEL),
        Span::raw(value),
    ])
}

fn attack_line(attack: &Attack) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("  {}", attack.name))];
    if let Some(kind) = &attack.kind {
        spans.push(Span::styled(format!("  {kind}"), LABEL));
    }
    if let Some(damage) = attack.damage {
        spans.push(Span::styled(
            format!("  {damage}"),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

impl Component<Action> for ResultView {
    type Props<'a> = ResultViewProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return Vec::new();
        };

        let items = Self::evolution_items(props.state);
        if items.is_empty() {
            return Vec::new();
        }
        let selected = props.state.evolution_selected.min(items.len() - 1);

        match key.code {
            KeyCode::Enter => Self::jump_targets(props.state)
                .into_iter()
                .nth(selected)
                .map(|signal| vec![(props.on_jump)(signal)])
                .unwrap_or_default(),
            KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') => {
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected,
                    is_focused: true,
                    style: Self::list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: false,
                        wrap_navigation: false,
                    },
                    on_select: props.on_select,
                    render_item: &|item| item.clone(),
                };
                self.evolutions
                    .handle_event(event, list_props)
                    .into_iter()
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        sprite_backend::clear_sprite();
        let border_color = if props.is_focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let title = if state.revalidating {
            " Result (refreshing\u{2026}) "
        } else {
            " Result "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let query = &state.location.q;
        let detail = match &state.result {
            DataResource::Empty => {
                frame.render_widget(
                    Self::message("Type a Pokemon name to search".into(), Color::DarkGray),
                    inner,
                );
                return;
            }
            DataResource::Loading => {
                frame.render_widget(
                    Self::message(format!("Loading {query}\u{2026}"), Color::DarkGray),
                    inner,
                );
                return;
            }
            DataResource::Failed(error) => {
                frame.render_widget(
                    Self::message(format!("Could not load {query}: {error}"), Color::Red),
                    inner,
                );
                return;
            }
            DataResource::Loaded(None) => {
                frame.render_widget(
                    Self::message(format!("No Pokemon named \"{query}\""), Color::Reset),
                    inner,
                );
                return;
            }
            DataResource::Loaded(Some(detail)) => detail,
        };

        let chunks =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(34)]).split(inner);
        let mut text_area = chunks[0];
        if props.show_sprite && detail.image.is_some() && text_area.height > SPRITE_ROWS + 4 {
            let rows = Layout::vertical([Constraint::Length(SPRITE_ROWS), Constraint::Min(0)])
                .split(text_area);
            Self::render_sprite(frame, rows[0], state);
            text_area = rows[1];
        }
        frame.render_widget(
            Paragraph::new(Self::detail_lines(detail)).wrap(Wrap { trim: false }),
            text_area,
        );

        let evolution_block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Evolutions ");
        let list_area = evolution_block.inner(chunks[1]);
        frame.render_widget(evolution_block, chunks[1]);

        let items = Self::evolution_items(state);
        if items.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(" No evolutions", LABEL)),
                list_area,
            );
            return;
        }
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: state.evolution_selected.min(items.len() - 1),
            is_focused: props.is_focused,
            style: Self::list_style(),
            behavior: SelectListBehavior {
                show_scrollbar: false,
                wrap_navigation: false,
            },
            on_select: props.on_select,
            render_item: &|item| item.clone(),
        };
        self.evolutions.render(frame, list_area, list_props);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::QueryLocation;
    use crate::state::{EvolutionStub, SizeRange};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use tui_dispatch::testing::*;

    fn bulbasaur() -> PokemonDetail {
        PokemonDetail {
            name: "Bulbasaur".into(),
            number: Some("001".into()),
            classification: Some("Seed Pokemon".into()),
            types: vec!["Grass".into(), "Poison".into()],
            weight: Some(SizeRange {
                minimum: Some("6.04kg".into()),
                maximum: Some("7.76kg".into()),
            }),
            evolutions: vec![
                EvolutionStub {
                    name: Some("Ivysaur".into()),
                    types: vec!["Grass".into(), "Poison".into()],
                },
                EvolutionStub {
                    name: None,
                    types: vec![],
                },
                EvolutionStub {
                    name: Some("Venusaur".into()),
                    types: vec![],
                },
            ],
            ..Default::default()
        }
    }

    fn loaded(detail: Option<PokemonDetail>) -> AppState {
        AppState {
            result: DataResource::Loaded(detail),
            ..AppState::new(QueryLocation::new("Bulbasaur"))
        }
    }

    fn props(state: &AppState) -> ResultViewProps<'_> {
        ResultViewProps {
            state,
            is_focused: true,
            show_sprite: true,
            on_select: Action::ResultEvolutionSelect,
            on_jump: Action::SearchExternalJump,
        }
    }

    fn render(state: &AppState) -> String {
        let mut harness = RenderHarness::new(70, 20);
        let mut view = ResultView::new();
        harness.render_to_string_plain(|frame| {
            view.render(frame, frame.area(), props(state));
        })
    }

    #[test]
    fn test_enter_jumps_to_selected_named_evolution() {
        let mut state = loaded(Some(bulbasaur()));
        state.evolution_selected = 1;
        let mut view = ResultView::new();

        let actions: Vec<_> = view
            .handle_event(
                &EventKind::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
                props(&state),
            )
            .into_iter()
            .collect();

        actions.assert_count(1);
        actions.assert_first(Action::SearchExternalJump(
            JumpSignal::new("Venusaur").unwrap(),
        ));
    }

    #[test]
    fn test_unfocused_view_ignores_keys() {
        let state = loaded(Some(bulbasaur()));
        let mut view = ResultView::new();
        let actions: Vec<_> = view
            .handle_event(
                &EventKind::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
                ResultViewProps {
                    is_focused: false,
                    ..props(&state)
                },
            )
            .into_iter()
            .collect();
        actions.assert_empty();
    }

    #[test]
    fn test_render_ready() {
        let output = render(&loaded(Some(bulbasaur())));
        assert!(output.contains("#001"));
        assert!(output.contains("Bulbasaur"));
        assert!(output.contains("Grass, Poison"));
        assert!(output.contains("6.04kg - 7.76kg"));
        assert!(output.contains("Ivysaur"));
        assert!(output.contains("Venusaur"));
        assert!(output.contains("Ivysaur  Grass, Poison"));
        assert!(output.contains("No attacks available"));
    }

    #[test]
    fn test_render_attacks_and_no_evolutions() {
        let mut detail = bulbasaur();
        detail.evolutions.clear();
        detail.attacks.fast.push(Attack {
            name: "Tackle".into(),
            kind: Some("Normal".into()),
            damage: Some(12),
        });
        let output = render(&loaded(Some(detail)));
        assert!(output.contains("Fast attacks"));
        assert!(output.contains("Tackle"));
        assert!(!output.contains("No attacks available"));
        assert!(output.contains("No evolutions"));
    }

    #[test]
    fn test_render_artwork_placeholder() {
        let mut state = loaded(Some(PokemonDetail {
            image: Some("https://img.test/1.png".into()),
            ..bulbasaur()
        }));
        state.sprite_loading = true;
        let output = render(&state);
        assert!(output.contains("[loading artwork]"));
        assert!(output.contains("Grass, Poison"));

        state.sprite_loading = false;
        assert!(render(&state).contains("[no artwork]"));

        let hidden = RenderHarness::new(70, 20).render_to_string_plain(|frame| {
            let props = ResultViewProps {
                show_sprite: false,
                ..props(&state)
            };
            ResultView::new().render(frame, frame.area(), props);
        });
        assert!(!hidden.contains("artwork"));
    }

    #[test]
    fn test_render_states() {
        let empty = AppState::default();
        assert!(render(&empty).contains("Type a Pokemon name"));

        let loading = AppState {
            result: DataResource::Loading,
            ..AppState::new(QueryLocation::new("Mew"))
        };
        assert!(render(&loading).contains("Loading Mew"));

        let failed = AppState {
            result: DataResource::Failed("timeout".into()),
            ..AppState::new(QueryLocation::new("Mew"))
        };
        assert!(render(&failed).contains("timeout"));

        let not_found = loaded(None);
        let output = render(&not_found);
        assert!(output.contains("No Pokemon named"));
        assert!(!output.contains("Could not load"));
    }
}
