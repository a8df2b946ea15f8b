//! Chat panel rendering (message list + input box).

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::theme;
use crate::app::App;

/// Render the chat panel (messages + input box).
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    render_messages(frame, chunks[0], app);
    render_input(frame, chunks[1], app);
}

/// Render the message list, own messages on the right, the peer's on the
/// left.
fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.loading {
        vec![ListItem::new(Line::from(Span::styled(
            "Loading conversation...",
            theme::dimmed(),
        )))]
    } else {
        app.messages
            .iter()
            .map(|msg| {
                let own = app.is_own(msg);
                let style = if own {
                    theme::own_message()
                } else {
                    theme::peer_message()
                };
                let line = Line::from(vec![
                    Span::styled(app.format_timestamp(msg.sent_at), theme::timestamp()),
                    Span::raw(" "),
                    Span::styled(&msg.body, style),
                ])
                .alignment(if own {
                    Alignment::Right
                } else {
                    Alignment::Left
                });
                ListItem::new(line)
            })
            .collect()
    };

    let block = Block::default()
        .title(format!("Chat with {}", app.peer_name))
        .borders(Borders::ALL)
        .border_style(theme::normal());

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

/// Render the input box.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let mut display_text = app.input.clone();
    if app.cursor_position >= display_text.len() {
        display_text.push('█');
    } else {
        display_text.insert(app.cursor_position, '█');
    }

    let input_line = if app.input.is_empty() {
        Line::from(vec![
            Span::styled("█", theme::bold()),
            Span::styled(" Type a message...", theme::dimmed()),
        ])
    } else {
        Line::from(Span::styled(display_text, theme::normal()))
    };

    let block = Block::default().title("Message").borders(Borders::ALL);
    let paragraph = Paragraph::new(input_line).block(block);
    frame.render_widget(paragraph, area);
}
