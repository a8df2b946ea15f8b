//! User profile types for the directory and auth plumbing.

use serde::{Deserialize, Serialize};

use crate::document::UserId;

/// A base64-encoded profile image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wraps an already-encoded base64 string.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the base64 payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the encoded size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A registered user as stored in the user collection.
///
/// `password_digest` is a hex-encoded SHA-256 of the password; the clear
/// text never reaches the store. `push_token` is present only while the
/// user has a registered notification endpoint (deleted at sign-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Store-assigned identity.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Sign-in email, unique within the store.
    pub email: String,
    /// Hex-encoded SHA-256 password digest.
    pub password_digest: String,
    /// Optional encoded profile image.
    pub avatar: Option<EncodedImage>,
    /// Push-notification token, if registered.
    pub push_token: Option<String>,
}

impl UserProfile {
    /// Returns "First Last" for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
