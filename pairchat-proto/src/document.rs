//! Message document types for the `PairChat` store.
//!
//! A [`MessageDoc`] is the form a message takes inside the document store
//! and on the change feed. The store assigns the [`DocumentKey`] and the
//! `sent_at` timestamp at append time; a document observed on the feed may
//! nevertheless be missing `body` or `sent_at` (field anomaly), which is
//! why both are optional here. Consumers substitute safe defaults instead
//! of dropping such documents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed message body size in bytes (64 KB).
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Opaque identity string for a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier from an existing string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh time-ordered user identifier (UUID v7 string).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the string representation of this identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned unique identifier for a message document.
///
/// Used for de-duplication across at-least-once deliveries, and as the
/// deterministic tiebreak when two messages carry the same timestamp.
/// Keys compare lexicographically ([`Ord`]); store-generated keys are
/// UUID v7 strings, so key order roughly tracks append order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Creates a document key from an existing string representation.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a fresh time-ordered document key (UUID v7 string).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the string representation of this key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A message document as stored and as delivered on the change feed.
///
/// `body` and `sent_at` are optional on the feed: a delivered document may
/// be missing either one, and consumers recover with safe defaults (empty
/// body, local receipt time) rather than dropping the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDoc {
    /// Store-assigned unique key.
    pub key: DocumentKey,
    /// Who sent this message.
    pub sender_id: UserId,
    /// Who the message is addressed to.
    pub receiver_id: UserId,
    /// Text payload, if present.
    pub body: Option<String>,
    /// Store-assigned send timestamp (the authoritative ordering key), if present.
    pub sent_at: Option<Timestamp>,
}

/// Error returned when a write request fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Message body is empty after trimming.
    #[error("message body is empty")]
    Empty,
    /// Message body exceeds the maximum allowed size.
    #[error("message too large ({size} bytes, max {max} bytes)")]
    TooLarge {
        /// Actual size of the body in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },
}

/// A request to append one message to the store.
///
/// The store assigns the document key and `sent_at` timestamp; the writer
/// only supplies the participants and the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// The sending identity.
    pub sender_id: UserId,
    /// The receiving identity.
    pub receiver_id: UserId,
    /// Text payload.
    pub body: String,
}

impl WriteRequest {
    /// Validates this request for appending.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if the body is blank, or
    /// [`ValidationError::TooLarge`] if it exceeds [`MAX_BODY_SIZE`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.body.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        let size = self.body.len();
        if size > MAX_BODY_SIZE {
            return Err(ValidationError::TooLarge {
                size,
                max: MAX_BODY_SIZE,
            });
        }
        Ok(())
    }
}
