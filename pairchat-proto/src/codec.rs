//! Snapshot serialization for store persistence.
//!
//! Provides encode/decode for [`StoreSnapshot`] using postcard, prefixed
//! with a one-byte format version so an on-disk snapshot written by a
//! newer, incompatible build is rejected instead of misread.

use serde::{Deserialize, Serialize};

use crate::document::MessageDoc;
use crate::user::UserProfile;

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The input carried no bytes at all.
    #[error("empty snapshot payload")]
    Empty,
    /// The version byte does not match [`FORMAT_VERSION`].
    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version byte found in the input.
        found: u8,
        /// Version this build understands.
        expected: u8,
    },
}

/// The full persisted state of a store: every message and user document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// All message documents, in append order.
    pub messages: Vec<MessageDoc>,
    /// All user profiles.
    pub users: Vec<UserProfile>,
}

/// Encodes a snapshot into a version-prefixed byte vector.
///
/// Wire format: `[version byte][postcard payload]`
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the snapshot cannot be
/// serialized.
pub fn encode_snapshot(snapshot: &StoreSnapshot) -> Result<Vec<u8>, CodecError> {
    let payload =
        postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a version-prefixed snapshot from a byte slice.
///
/// # Errors
///
/// Returns [`CodecError::Empty`] for zero-length input,
/// [`CodecError::UnsupportedVersion`] if the version byte is unknown, or
/// [`CodecError::Serialization`] if the payload cannot be deserialized.
pub fn decode_snapshot(bytes: &[u8]) -> Result<StoreSnapshot, CodecError> {
    let (version, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    if *version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: *version,
            expected: FORMAT_VERSION,
        });
    }
    postcard::from_bytes(payload).map_err(|e| CodecError::Serialization(e.to_string()))
}
