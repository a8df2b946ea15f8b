//! Push-token registration against the user collection.
//!
//! The push service itself is external; this module only covers the seam:
//! fetching a token from a [`TokenProvider`] and writing it onto the
//! signed-in user's profile so the backend can route notifications. The
//! token is deleted again at sign-out.

use pairchat_proto::document::UserId;
use pairchat_store::{MemoryStore, UserStoreError};

/// Errors raised while registering or clearing a push token.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The provider could not produce a token.
    #[error("token provider failed: {0}")]
    Provider(String),
    /// The user collection rejected the update.
    #[error("user store error: {0}")]
    Store(#[from] UserStoreError),
}

/// Source of push-notification tokens.
///
/// Real deployments back this with a platform messaging SDK; tests and
/// the demo use [`StaticProvider`].
pub trait TokenProvider {
    /// Produces the current device token.
    ///
    /// # Errors
    ///
    /// Returns a provider-specific description of why no token is
    /// available.
    fn fetch(&self) -> Result<String, String>;
}

/// A provider that always returns one fixed token.
pub struct StaticProvider(String);

impl StaticProvider {
    /// Creates a provider returning `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticProvider {
    fn fetch(&self) -> Result<String, String> {
        Ok(self.0.clone())
    }
}

/// Fetches a token and registers it on the user's profile.
///
/// Returns the registered token. Failures are surfaced to the caller but
/// are not fatal to the application: chatting works without push.
///
/// # Errors
///
/// Returns [`NotifyError::Provider`] if no token is available or
/// [`NotifyError::Store`] if the profile update fails.
pub fn register(
    store: &MemoryStore,
    provider: &dyn TokenProvider,
    user_id: &UserId,
) -> Result<String, NotifyError> {
    let token = provider.fetch().map_err(NotifyError::Provider)?;
    store.set_push_token(user_id, Some(token.clone()))?;
    tracing::info!(user = %user_id, "push token registered");
    Ok(token)
}

/// Deletes the user's registered token, if any.
///
/// # Errors
///
/// Returns [`NotifyError::Store`] if the profile update fails.
pub fn unregister(store: &MemoryStore, user_id: &UserId) -> Result<(), NotifyError> {
    store.set_push_token(user_id, None)?;
    tracing::info!(user = %user_id, "push token cleared");
    Ok(())
}
