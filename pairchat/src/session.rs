//! Signed-in session state and its on-disk persistence.
//!
//! The session is an explicitly passed value, never process-global: the
//! conversation engine and composer receive the identities they work
//! with, which keeps them testable with synthetic users. The
//! [`SessionStore`] persists the session between runs as TOML under the
//! user's config directory, next to the client config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use pairchat_proto::document::UserId;
use pairchat_proto::user::{EncodedImage, UserProfile};

/// Errors raised while loading or saving the session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Could not determine the user's config directory.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
    /// Reading or writing the session file failed.
    #[error("session file I/O failed for {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The session file is not valid TOML.
    #[error("failed to parse session file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The session could not be serialized.
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The signed-in user's identity and display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in identity.
    pub user_id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Sign-in email.
    pub email: String,
    /// Encoded profile image, if one was provided at sign-up.
    pub avatar: Option<EncodedImage>,
}

impl Session {
    /// Builds a session from a stored profile (after credential checks).
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            avatar: profile.avatar.clone(),
        }
    }

    /// Returns "First Last" for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Shared cell for the current session, for UI and plumbing that need a
/// read-mostly view of who is signed in.
pub type SharedSession = Arc<RwLock<Option<Session>>>;

/// Persists the session between runs.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store reading and writing `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default session file location:
    /// `~/.config/pairchat/session.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoConfigDir`] if no config directory can be
    /// determined.
    pub fn default_path() -> Result<PathBuf, SessionError> {
        dirs::config_dir()
            .map(|dir| dir.join("pairchat").join("session.toml"))
            .ok_or(SessionError::NoConfigDir)
    }

    /// The path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted session, if any.
    ///
    /// A missing file yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file exists but cannot be read,
    /// or [`SessionError::Parse`] if it is not valid TOML.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(Some(toml::from_str(&text)?))
    }

    /// Persists the session, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Serialize`] or [`SessionError::Io`].
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let text = toml::to_string_pretty(session)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Removes the persisted session (sign-out). A missing file is fine.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] for any failure other than the file
    /// not existing.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
