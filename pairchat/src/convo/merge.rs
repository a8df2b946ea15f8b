//! Pure merge functions for the conversation view state.
//!
//! Two independent change streams feed one conversation, with no ordering
//! guarantee between them and at-least-once delivery within each. These
//! functions fold arriving batches into a single chronologically-sorted,
//! deduplicated message list, and decide what the view should do about
//! each batch. They are deliberately free of channels and locks so every
//! merge property can be tested directly.

use std::collections::HashSet;

use pairchat_proto::change::{ChangeBatch, ChangeKind};
use pairchat_proto::document::{DocumentKey, MessageDoc, Timestamp, UserId};

use super::render::RenderInstruction;

/// A message in its resolved, renderable form.
///
/// Unlike [`MessageDoc`], every field is present: construction substitutes
/// safe defaults for feed anomalies (empty body, local receipt time for a
/// missing `sent_at`) so a damaged document still becomes visible instead
/// of being dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned unique key.
    pub key: DocumentKey,
    /// Who sent this message.
    pub sender_id: UserId,
    /// Who it is addressed to.
    pub receiver_id: UserId,
    /// Text payload.
    pub body: String,
    /// Ordering timestamp: the store's `sent_at`, or the local receipt
    /// time if the document arrived without one.
    pub sent_at: Timestamp,
}

impl Message {
    /// Resolves a feed document into a renderable message.
    #[must_use]
    pub fn from_doc(doc: MessageDoc, received_at: Timestamp) -> Self {
        if doc.sent_at.is_none() {
            tracing::warn!(key = %doc.key, "document missing sent_at, using receipt time");
        }
        Self {
            key: doc.key,
            sender_id: doc.sender_id,
            receiver_id: doc.receiver_id,
            body: doc.body.unwrap_or_default(),
            sent_at: doc.sent_at.unwrap_or(received_at),
        }
    }

    /// The total-order sort key: `(sent_at, key)` ascending.
    ///
    /// `sent_at` is the only externally meaningful ordering signal across
    /// independently-delivered channels; the key tiebreak makes
    /// same-timestamp ordering deterministic instead of arrival-dependent.
    #[must_use]
    pub fn sort_key(&self) -> (Timestamp, &DocumentKey) {
        (self.sent_at, &self.key)
    }
}

/// The accumulated view state of one conversation.
///
/// Owned exclusively by the conversation actor; both channels' batches
/// pass through the same instance, which is what keeps `seen` and
/// `messages` consistent under concurrent delivery.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    seen: HashSet<DocumentKey>,
}

impl ConversationState {
    /// Creates an empty state for a freshly opened conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the merged messages in `(sent_at, key)` order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of merged messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no messages have been merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns `true` if no batch has contributed anything yet — no
    /// messages and no seen keys. This, not the change kind, is what
    /// distinguishes the initial snapshot burst from later deltas: both
    /// arrive as plain `Added` changes.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.messages.is_empty() && self.seen.is_empty()
    }
}

/// Folds one change batch into the state; returns how many messages were
/// actually added.
///
/// Per change:
/// - `Added` with an unseen key: resolve the document and insert it at its
///   sorted position (binary search, so a batch of k costs O(k·(log n + n))
///   worst case rather than a full re-sort).
/// - `Added` with a seen key: ignore — at-least-once re-delivery.
/// - `Modified` / `Removed`: not expected in this domain; logged and
///   ignored, never an error.
pub fn apply_batch(
    state: &mut ConversationState,
    batch: &ChangeBatch,
    received_at: Timestamp,
) -> usize {
    let mut added = 0;
    for change in batch.changes() {
        match change.kind {
            ChangeKind::Added => {
                if state.seen.contains(&change.doc.key) {
                    tracing::debug!(key = %change.doc.key, "duplicate delivery ignored");
                    continue;
                }
                let message = Message::from_doc(change.doc.clone(), received_at);
                let pos = state
                    .messages
                    .partition_point(|existing| existing.sort_key() < message.sort_key());
                state.seen.insert(message.key.clone());
                state.messages.insert(pos, message);
                added += 1;
            }
            ChangeKind::Modified | ChangeKind::Removed => {
                tracing::debug!(
                    key = %change.doc.key,
                    kind = ?change.kind,
                    "unexpected change kind ignored"
                );
            }
        }
    }
    added
}

/// Decides the render instruction for a just-processed batch.
///
/// `was_untouched` must be captured *before* the batch was applied.
/// - Nothing added: no instruction (all duplicates or ignored kinds).
/// - Added into an untouched state: [`RenderInstruction::FullReset`] — the
///   batch was the initial backfill, so the view replaces its list without
///   being yanked to the bottom.
/// - Added into a live state: [`RenderInstruction::IncrementalAppend`]
///   covering the `added` tail positions, with a scroll-to-end hint.
#[must_use]
pub fn plan_render(
    was_untouched: bool,
    added: usize,
    state: &ConversationState,
) -> Option<RenderInstruction> {
    if added == 0 {
        return None;
    }
    let messages = state.messages().to_vec();
    let total = messages.len();
    if was_untouched {
        Some(RenderInstruction::FullReset {
            messages,
            scroll_to_end: false,
        })
    } else {
        Some(RenderInstruction::IncrementalAppend {
            messages,
            range_start: total - added,
            range_end: total,
            scroll_to_end: true,
        })
    }
}
