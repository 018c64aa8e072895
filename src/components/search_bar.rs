use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    BaseStyle, Padding, TextInput, TextInputProps, TextInputStyle, highlight_substring,
};

use super::Component;
use crate::action::{Action, NavKey};
use crate::state::{DropdownMode, MAX_QUERY_LEN, SearchState};

const PLACEHOLDER: &str = "Search Pokemon...";
const HISTORY_MARK: &str = "\u{21ba} ";

/// Rows used by the input and its status line; the dropdown goes below.
pub const SEARCH_BAR_HEIGHT: u16 = 4;

/// Text input with the suggestion/history dropdown
#[derive(Default)]
pub struct SearchBar {
    input: TextInput,
    /// Text the input's cursor was last positioned against
    synced: String,
}

pub struct SearchBarProps<'a> {
    pub search: &'a SearchState,
    /// Rows of the open dropdown, already resolved for the current mode
    pub items: &'a [String],
    pub names_loading: bool,
    pub names_failed: bool,
    pub is_focused: bool,
    pub on_change: fn(String) -> Action,
    pub on_key: fn(NavKey) -> Action,
    pub on_pick: fn(String) -> Action,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the input with the cursor at the end when the text was
    /// rewritten outside of it (commit, jump, back, initial query).
    fn sync(&mut self, text: &str) {
        if self.synced == text {
            return;
        }
        self.input = TextInput::new();
        let end = EventKind::Key(KeyEvent::new(KeyCode::End, KeyModifiers::NONE));
        let input_props = TextInputProps {
            value: text,
            placeholder: PLACEHOLDER,
            is_focused: true,
            style: Self::input_style(),
            on_change: Action::SearchTextChange,
            on_submit: |_| Action::SearchKey(NavKey::Enter),
            on_cursor_move: None,
        };
        let _ = self.input.handle_event(&end, input_props);
        self.synced = text.to_string();
    }

    fn input_style() -> TextInputStyle {
        TextInputStyle {
            base: BaseStyle {
                border: None,
                padding: Padding::xy(1, 0),
                bg: Some(Color::Rgb(40, 40, 52)),
                fg: None,
            },
            placeholder_style: None,
            cursor_style: None,
        }
    }

    fn status_line(props: &SearchBarProps<'_>) -> Line<'static> {
        let mut spans = Vec::new();
        if props.names_loading {
            spans.push(Span::styled(
                "searching\u{2026}",
                Style::default().fg(Color::DarkGray),
            ));
        }
        if props.names_failed {
            spans.push(Span::styled("error", Style::default().fg(Color::Red)));
        }
        if props.search.notice {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("limit reached ({MAX_QUERY_LEN})"),
                Style::default().fg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }

    fn dropdown_lines(props: &SearchBarProps<'_>) -> Vec<Line<'static>> {
        let base = Style::default().fg(Color::Reset);
        let highlight = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let query = props.search.text.trim();
        props
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut spans = vec![Span::styled(
                    format!("{} ", index + 1),
                    Style::default().fg(Color::DarkGray),
                )];
                match props.search.dropdown {
                    DropdownMode::History => {
                        spans.push(Span::styled(HISTORY_MARK, Style::default().fg(Color::Cyan)));
                        spans.push(Span::styled(item.clone(), base));
                    }
                    _ => spans.extend(highlight_substring(item, query, base, highlight).spans),
                }
                let mut line = Line::from(spans);
                if props.search.selected_index == Some(index) {
                    line = line.style(Style::default().bg(Color::Rgb(60, 60, 90)));
                }
                line
            })
            .collect()
    }
}

impl Component<Action> for SearchBar {
    type Props<'a> = SearchBarProps<'a>;

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

        // Leave app-level chords to the global handler
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            return match key.code {
                KeyCode::Char(digit @ '1'..='8') if props.search.dropdown != DropdownMode::Closed => {
                    let index = (digit as usize) - ('1' as usize);
                    props
                        .items
                        .get(index)
                        .map(|item| vec![(props.on_pick)(item.clone())])
                        .unwrap_or_default()
                }
                _ => Vec::new(),
            };
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => return Vec::new(),
            KeyCode::Esc => return vec![(props.on_key)(NavKey::Escape)],
            KeyCode::Enter => return vec![(props.on_key)(NavKey::Enter)],
            KeyCode::Down => return vec![(props.on_key)(NavKey::Down)],
            KeyCode::Up => return vec![(props.on_key)(NavKey::Up)],
            _ => {}
        }

        self.sync(&props.search.text);
        let input_props = TextInputProps {
            value: &props.search.text,
            placeholder: PLACEHOLDER,
            is_focused: true,
            style: Self::input_style(),
            on_change: props.on_change,
            on_submit: |_| Action::SearchKey(NavKey::Enter),
            on_cursor_move: Some(|_| Action::Render),
        };
        let actions: Vec<_> = self.input.handle_event(event, input_props).into_iter().collect();
        for action in &actions {
            if let Action::SearchTextChange(text) = action {
                self.synced = text.clone();
            }
        }
        actions
    }

    /// `area` spans the bar and the space the dropdown may cover.
    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
            Constraint::Min(0),    // Dropdown overlay
        ])
        .split(area);

        let border_color = if props.is_focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Search ");
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        self.sync(&props.search.text);
        let input_props = TextInputProps {
            value: &props.search.text,
            placeholder: PLACEHOLDER,
            is_focused: props.is_focused,
            style: Self::input_style(),
            on_change: props.on_change,
            on_submit: |_| Action::SearchKey(NavKey::Enter),
            on_cursor_move: Some(|_| Action::Render),
        };
        self.input.render(frame, inner, input_props);

        frame.render_widget(
            Paragraph::new(Self::status_line(&props)).alignment(Alignment::Right),
            chunks[1],
        );

        if props.search.dropdown == DropdownMode::Closed || props.items.is_empty() {
            return;
        }
        let overlay = chunks[2];
        let height = (props.items.len() as u16 + 2).min(overlay.height);
        if height < 3 {
            return;
        }
        let dropdown_area = Rect {
            height,
            width: overlay.width.min(40),
            ..overlay
        };
        let title = match props.search.dropdown {
            DropdownMode::History => " Recent ",
            _ => " Suggestions ",
        };
        frame.render_widget(Clear, dropdown_area);
        frame.render_widget(
            Paragraph::new(Self::dropdown_lines(&props)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(title)
                    .title_bottom(" alt+1-8 pick "),
            ),
            dropdown_area,
        );
    }
}
