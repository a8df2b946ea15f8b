//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for the peer's messages and the header.
pub const PEER: Color = Color::Cyan;

/// Color for the signed-in user's own messages.
pub const OWN: Color = Color::Green;

/// Warning color for transient notices.
pub const WARNING: Color = Color::Yellow;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (timestamps, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Style for the peer's messages.
#[must_use]
pub fn peer_message() -> Style {
    Style::default().fg(PEER)
}

/// Style for the signed-in user's own messages.
#[must_use]
pub fn own_message() -> Style {
    Style::default().fg(OWN)
}

/// Style for transient notices (channel failures, send errors).
#[must_use]
pub fn notice() -> Style {
    Style::default().fg(WARNING).add_modifier(Modifier::ITALIC)
}

/// Style for timestamps (dark gray).
#[must_use]
pub fn timestamp() -> Style {
    Style::default().fg(Color::Rgb(120, 120, 120))
}

/// Style for the status bar background.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}
