//! Snapshot persistence for the document store.
//!
//! Saves and loads the store's collections through the versioned
//! snapshot codec. A missing file on load is not an error — it simply
//! yields an empty store, the same way a fresh install starts.

use std::path::{Path, PathBuf};

use pairchat_proto::codec::{self, CodecError};

use crate::store::MemoryStore;

/// Errors raised while persisting or restoring a store snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The snapshot bytes could not be encoded or decoded.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Writes the store's current snapshot to `path`.
///
/// # Errors
///
/// Returns [`PersistError::Codec`] if encoding fails or
/// [`PersistError::Io`] if the file cannot be written.
pub fn save(store: &MemoryStore, path: &Path) -> Result<(), PersistError> {
    let bytes = codec::encode_snapshot(&store.snapshot())?;
    std::fs::write(path, &bytes).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "store snapshot saved");
    Ok(())
}

/// Loads a store from a snapshot file, or returns an empty store if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the file exists but cannot be read, or
/// [`PersistError::Codec`] if its contents cannot be decoded.
pub fn load(path: &Path, subscription_capacity: usize) -> Result<MemoryStore, PersistError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(MemoryStore::with_subscription_capacity(
                subscription_capacity,
            ));
        }
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let snapshot = codec::decode_snapshot(&bytes)?;
    tracing::info!(
        path = %path.display(),
        messages = snapshot.messages.len(),
        users = snapshot.users.len(),
        "store snapshot loaded"
    );
    Ok(MemoryStore::from_snapshot(snapshot, subscription_capacity))
}
