//! Render instructions emitted to the conversation view.
//!
//! The view layer performs no business logic: it receives the ordered
//! message list together with an instruction saying how to apply it, plus
//! a scroll hint. What it does with pixels is its own concern.

use super::merge::Message;

/// An abstract command telling the view how to update its list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    /// Replace the entire visible list. Emitted once per conversation, for
    /// the first batch that contributes messages (the historical
    /// backfill). The scroll hint is off: opening a conversation with
    /// history must not yank the viewport to the bottom.
    FullReset {
        /// The full ordered message list.
        messages: Vec<Message>,
        /// Whether the view should jump to the most recent message.
        scroll_to_end: bool,
    },
    /// The ordered list grew; positions `[range_start, range_end)` are
    /// new. Carries the full updated list so the view holds no stale
    /// state, plus a scroll-to-end hint for genuinely new messages.
    IncrementalAppend {
        /// The full ordered message list after the append.
        messages: Vec<Message>,
        /// First changed position.
        range_start: usize,
        /// One past the last changed position.
        range_end: usize,
        /// Whether the view should jump to the most recent message.
        scroll_to_end: bool,
    },
}

impl RenderInstruction {
    /// The ordered message list this instruction carries.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        match self {
            Self::FullReset { messages, .. } | Self::IncrementalAppend { messages, .. } => messages,
        }
    }

    /// Whether the view should scroll to the conversation end.
    #[must_use]
    pub const fn scroll_to_end(&self) -> bool {
        match self {
            Self::FullReset { scroll_to_end, .. }
            | Self::IncrementalAppend { scroll_to_end, .. } => *scroll_to_end,
        }
    }
}
