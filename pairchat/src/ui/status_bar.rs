//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::App;

/// Render the status bar at the bottom of the screen.
///
/// Shows who is signed in and the most recent transient notice, if any —
/// channel failures surface here without blocking the conversation.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("PairChat v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled(app.local_name.clone(), theme::normal()),
        Span::raw(" | "),
        Span::styled("Enter: send | ↑↓: scroll | Esc: quit", theme::dimmed()),
    ];

    if let Some(notice) = app.notices.last() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.clone(), theme::notice()));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
