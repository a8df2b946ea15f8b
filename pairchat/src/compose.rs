//! Message composition: turning user input into store writes.
//!
//! The composer is fire-and-forget: a successful send only means the
//! document was appended. The sender sees its own message when the store
//! delivers the `Added` change back on the outgoing conversation channel.

use pairchat_proto::document::{DocumentKey, UserId, ValidationError, WriteRequest};
use pairchat_store::{AppendError, MemoryStore};

/// Errors raised while composing and sending a message.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The message failed validation (empty, oversized).
    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationError),
    /// The store rejected the append.
    #[error("store rejected message: {0}")]
    Store(String),
}

impl From<AppendError> for ComposeError {
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::Validation(inner) => Self::Invalid(inner),
            AppendError::Closed => Self::Store(err.to_string()),
        }
    }
}

/// Builds write requests for one sending identity.
pub struct Composer {
    store: MemoryStore,
    sender_id: UserId,
}

impl Composer {
    /// Creates a composer writing on behalf of `sender_id`.
    #[must_use]
    pub const fn new(store: MemoryStore, sender_id: UserId) -> Self {
        Self { store, sender_id }
    }

    /// Validates and appends one message addressed to `receiver`.
    ///
    /// Returns the store-assigned document key.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Invalid`] for a blank or oversized body, or
    /// [`ComposeError::Store`] if the store is shut down.
    pub fn send(&self, receiver: &UserId, body: &str) -> Result<DocumentKey, ComposeError> {
        let request = WriteRequest {
            sender_id: self.sender_id.clone(),
            receiver_id: receiver.clone(),
            body: body.to_string(),
        };
        request.validate()?;
        let key = self.store.append(&request)?;
        tracing::debug!(key = %key, receiver = %receiver, "message appended");
        Ok(key)
    }
}
