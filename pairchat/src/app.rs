//! Application state and event handling for the terminal view.
//!
//! [`App`] is the conversation view: it holds the visible message list
//! and applies [`RenderInstruction`]s exactly as instructed, without any
//! merge logic of its own. A full reset replaces the list and leaves the
//! viewport where it was; an incremental append extends the list and
//! follows the scroll hint to the newest message.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use pairchat_proto::document::{Timestamp, UserId};

use crate::convo::{Message, RenderInstruction};

/// Maximum number of transient notices kept for display.
const MAX_NOTICES: usize = 5;

/// Main application state.
pub struct App {
    /// The signed-in identity (used to tell own messages from the peer's).
    local_id: UserId,
    /// The peer's display name for the header.
    pub peer_name: String,
    /// The signed-in user's display name.
    pub local_name: String,
    /// Current text input.
    pub input: String,
    /// Cursor position in input (byte index).
    pub cursor_position: usize,
    /// Messages in the conversation, as last rendered.
    pub messages: Vec<Message>,
    /// Scroll offset for the message list.
    pub message_scroll: usize,
    /// True until the first render instruction arrives (history loading).
    pub loading: bool,
    /// Transient, non-blocking notices (channel failures, send errors).
    pub notices: Vec<String>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Timestamp display format (chrono).
    timestamp_format: String,
}

impl App {
    /// Creates the view state for one conversation.
    #[must_use]
    pub fn new(
        local_id: UserId,
        local_name: impl Into<String>,
        peer_name: impl Into<String>,
        timestamp_format: impl Into<String>,
    ) -> Self {
        Self {
            local_id,
            peer_name: peer_name.into(),
            local_name: local_name.into(),
            input: String::new(),
            cursor_position: 0,
            messages: Vec::new(),
            message_scroll: 0,
            loading: true,
            notices: Vec::new(),
            should_quit: false,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Applies a render instruction from the conversation engine.
    pub fn apply_render(&mut self, instruction: RenderInstruction) {
        self.loading = false;
        match instruction {
            RenderInstruction::FullReset {
                messages,
                scroll_to_end,
            } => {
                self.messages = messages;
                if scroll_to_end {
                    self.scroll_to_end();
                } else {
                    // Opening with history must not yank the viewport down.
                    self.message_scroll = self
                        .message_scroll
                        .min(self.messages.len().saturating_sub(1));
                }
            }
            RenderInstruction::IncrementalAppend {
                messages,
                scroll_to_end,
                ..
            } => {
                self.messages = messages;
                if scroll_to_end {
                    self.scroll_to_end();
                }
            }
        }
    }

    /// Adds a transient notice, keeping only the most recent few.
    pub fn push_notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }

    /// Whether a message was sent by the signed-in user.
    #[must_use]
    pub fn is_own(&self, message: &Message) -> bool {
        message.sender_id == self.local_id
    }

    /// Formats a timestamp with the configured chrono format string.
    #[must_use]
    pub fn format_timestamp(&self, ts: Timestamp) -> String {
        use chrono::{Local, TimeZone};
        let millis = ts.as_millis();
        let secs = (millis / 1000).cast_signed();
        let nsecs = u32::try_from((millis % 1000) * 1_000_000).unwrap_or(0);
        match Local.timestamp_opt(secs, nsecs) {
            chrono::LocalResult::Single(dt) => dt.format(&self.timestamp_format).to_string(),
            _ => "??".to_string(),
        }
    }

    /// Handle a key event. Returns the message body to send when the user
    /// submits non-blank input.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<String> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Enter, _) => self.submit_message(),
            (KeyCode::Char(c), _) => {
                self.enter_char(c);
                None
            }
            (KeyCode::Backspace, _) => {
                self.delete_char();
                None
            }
            (KeyCode::Left, _) => {
                self.move_cursor_left();
                None
            }
            (KeyCode::Right, _) => {
                self.move_cursor_right();
                None
            }
            (KeyCode::Home, _) => {
                self.cursor_position = 0;
                None
            }
            (KeyCode::End, _) => {
                self.cursor_position = self.input.len();
                None
            }
            (KeyCode::Up, _) => {
                self.scroll_up();
                None
            }
            (KeyCode::Down, _) => {
                self.scroll_down();
                None
            }
            _ => None,
        }
    }

    /// Take the current input as a message body, if non-blank.
    fn submit_message(&mut self) -> Option<String> {
        if self.input.trim().is_empty() {
            return None;
        }
        let body = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        Some(body)
    }

    /// Insert a character at the cursor position.
    fn enter_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let mut chars: Vec<char> = self.input.chars().collect();
            let char_index = self.input[..self.cursor_position].chars().count() - 1;
            let removed = chars.remove(char_index);
            self.input = chars.into_iter().collect();
            self.cursor_position -= removed.len_utf8();
        }
    }

    /// Move cursor left by one character.
    fn move_cursor_left(&mut self) {
        if let Some(c) = self.input[..self.cursor_position].chars().next_back() {
            self.cursor_position -= c.len_utf8();
        }
    }

    /// Move cursor right by one character.
    fn move_cursor_right(&mut self) {
        if let Some(c) = self.input[self.cursor_position..].chars().next() {
            self.cursor_position += c.len_utf8();
        }
    }

    /// Scroll message list up.
    const fn scroll_up(&mut self) {
        if self.message_scroll > 0 {
            self.message_scroll -= 1;
        }
    }

    /// Scroll message list down.
    const fn scroll_down(&mut self) {
        if self.message_scroll < self.messages.len().saturating_sub(1) {
            self.message_scroll += 1;
        }
    }

    /// Jump the viewport to the most recent message.
    const fn scroll_to_end(&mut self) {
        self.message_scroll = self.messages.len().saturating_sub(1);
    }
}
