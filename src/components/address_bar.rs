use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Component;
use crate::action::Action;
use crate::location::QueryLocation;

/// One-line address display: `/?q=...` plus how far back navigation goes.
pub struct AddressBar;

pub struct AddressBarProps<'a> {
    pub location: &'a QueryLocation,
}

impl Component<Action> for AddressBar {
    type Props<'a> = AddressBarProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let mut spans = vec![
            Span::styled(
                " pokesearch ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(props.location.to_url(), Style::default().fg(Color::Cyan)),
        ];
        if props.location.can_go_back() {
            spans.push(Span::styled(
                format!("  \u{2190} {}", props.location.back.len()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
