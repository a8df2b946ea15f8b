//! Sign-up, sign-in, and sign-out against the user collection.
//!
//! Credentials are matched by equality lookup on email plus password
//! digest, the way the directory-backed store exposes them. Passwords are
//! digested with SHA-256 before they touch the store; beyond that this is
//! not a hardened authentication system and does not try to be one.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use pairchat_proto::document::UserId;
use pairchat_proto::user::{EncodedImage, UserProfile};
use pairchat_store::{MemoryStore, UserStoreError};

use crate::session::{Session, SessionError, SessionStore};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Deliberately loose: one @, something on both sides, a dot in the
    // domain part. Anything stricter rejects real addresses.
    #[allow(clippy::expect_used)]
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern is valid");
    re
});

/// Errors raised by the auth flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required field was blank.
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    /// The email does not look like an address.
    #[error("invalid email address")]
    InvalidEmail,
    /// The password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    /// Another account already uses this email.
    #[error("email is already registered")]
    EmailTaken,
    /// No account matches the email/password pair.
    #[error("incorrect email or password")]
    InvalidCredentials,
    /// The user collection rejected the operation.
    #[error("user store error: {0}")]
    Store(#[from] UserStoreError),
    /// The persisted session could not be updated.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Sign-in email.
    pub email: String,
    /// Clear-text password (digested before storage).
    pub password: String,
    /// Optional encoded profile image.
    pub avatar: Option<EncodedImage>,
}

/// Hex-encoded SHA-256 of a password.
#[must_use]
pub fn digest_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Creates an account and returns the resulting session.
///
/// # Errors
///
/// Returns [`AuthError::MissingField`], [`AuthError::InvalidEmail`], or
/// [`AuthError::PasswordTooShort`] for bad input, and
/// [`AuthError::EmailTaken`] if the email is already registered.
pub fn sign_up(store: &MemoryStore, new_user: NewUser) -> Result<Session, AuthError> {
    if new_user.first_name.trim().is_empty() {
        return Err(AuthError::MissingField("first name"));
    }
    if new_user.last_name.trim().is_empty() {
        return Err(AuthError::MissingField("last name"));
    }
    if new_user.email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if !EMAIL_RE.is_match(&new_user.email) {
        return Err(AuthError::InvalidEmail);
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }

    let profile = UserProfile {
        id: UserId::generate(),
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        email: new_user.email,
        password_digest: digest_password(&new_user.password),
        avatar: new_user.avatar,
        push_token: None,
    };
    match store.add_user(profile.clone()) {
        Ok(()) => {}
        Err(UserStoreError::EmailTaken(_)) => return Err(AuthError::EmailTaken),
        Err(err) => return Err(AuthError::Store(err)),
    }
    tracing::info!(user = %profile.id, "account created");
    Ok(Session::from_profile(&profile))
}

/// Signs in with an email/password pair.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] when no account matches.
pub fn sign_in(store: &MemoryStore, email: &str, password: &str) -> Result<Session, AuthError> {
    let digest = digest_password(password);
    let profile = store
        .find_by_credentials(email, &digest)
        .ok_or(AuthError::InvalidCredentials)?;
    tracing::info!(user = %profile.id, "signed in");
    Ok(Session::from_profile(&profile))
}

/// Signs out: deletes the push token and the persisted session.
///
/// # Errors
///
/// Returns [`AuthError::Store`] if the token cannot be deleted or
/// [`AuthError::Session`] if the session file cannot be removed.
pub fn sign_out(
    store: &MemoryStore,
    sessions: &SessionStore,
    user_id: &UserId,
) -> Result<(), AuthError> {
    store.set_push_token(user_id, None)?;
    sessions.clear()?;
    tracing::info!(user = %user_id, "signed out");
    Ok(())
}
