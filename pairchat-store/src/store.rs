//! The in-process document store.
//!
//! [`MemoryStore`] holds an append-only message collection and a user
//! collection behind `parking_lot` locks, and hands out change-feed
//! subscriptions over conjunctive equality filters. It is the in-process
//! stand-in for a managed document database: queries see an initial
//! snapshot followed by incremental change notifications, with
//! at-least-once delivery per change and no ordering guarantee across
//! separate subscriptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use pairchat_proto::change::{ChangeBatch, DocumentChange, Filter};
use pairchat_proto::codec::StoreSnapshot;
use pairchat_proto::document::{
    DocumentKey, MessageDoc, Timestamp, UserId, ValidationError, WriteRequest,
};
use pairchat_proto::user::UserProfile;

use crate::subscribe::{Registry, SubscribeError, Subscription, SubscriptionId};

/// Default per-subscription channel capacity.
const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 64;

/// Errors raised while appending a message document.
#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    /// The write request failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The store has been shut down.
    #[error("store is shut down")]
    Closed,
}

/// Errors raised by user-collection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// A profile with this email already exists.
    #[error("email {0} is already registered")]
    EmailTaken(String),
    /// No profile with this id exists.
    #[error("unknown user {0}")]
    UnknownUser(UserId),
}

struct StoreInner {
    messages: RwLock<Vec<MessageDoc>>,
    users: RwLock<Vec<UserProfile>>,
    subs: Mutex<Registry>,
    closed: AtomicBool,
    subscription_capacity: usize,
}

/// Shared handle to an in-process document store.
///
/// Cloning is cheap (`Arc` internally); all clones observe the same
/// collections and subscriber registry.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a new, empty store with the default subscription capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_subscription_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Creates a new, empty store with a custom per-subscription channel
    /// capacity.
    #[must_use]
    pub fn with_subscription_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                messages: RwLock::new(Vec::new()),
                users: RwLock::new(Vec::new()),
                subs: Mutex::new(Registry::new()),
                closed: AtomicBool::new(false),
                subscription_capacity: capacity.max(1),
            }),
        }
    }

    /// Rebuilds a store from a persisted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot, capacity: usize) -> Self {
        let store = Self::with_subscription_capacity(capacity);
        *store.inner.messages.write() = snapshot.messages;
        *store.inner.users.write() = snapshot.users;
        store
    }

    /// Captures the current collections for persistence.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            messages: self.inner.messages.read().clone(),
            users: self.inner.users.read().clone(),
        }
    }

    // -- messages --------------------------------------------------------

    /// Appends one message document.
    ///
    /// The store assigns the document key and the `sent_at` timestamp,
    /// stores the document append-only, and fans an `Added` change out to
    /// every matching live subscription. There is no delivery
    /// acknowledgement: a sender observes its own message only through the
    /// change feed.
    ///
    /// # Errors
    ///
    /// Returns [`AppendError::Validation`] for an empty or oversized body,
    /// or [`AppendError::Closed`] after [`shutdown`](Self::shutdown).
    pub fn append(&self, request: &WriteRequest) -> Result<DocumentKey, AppendError> {
        request.validate()?;
        let doc = MessageDoc {
            key: DocumentKey::generate(),
            sender_id: request.sender_id.clone(),
            receiver_id: request.receiver_id.clone(),
            body: Some(request.body.clone()),
            sent_at: Some(Timestamp::now()),
        };
        let key = doc.key.clone();
        self.append_doc(doc)?;
        Ok(key)
    }

    /// Appends a fully-formed document, keeping its key and timestamp.
    ///
    /// This is the import/restore path: snapshot replays and test fixtures
    /// insert documents with known keys and timestamps through here. The
    /// fan-out behaves exactly as for [`append`](Self::append).
    ///
    /// A subscription established concurrently with an append may observe
    /// the document both in its snapshot and as a subsequent incremental
    /// change; consumers deduplicate by document key.
    ///
    /// # Errors
    ///
    /// Returns [`AppendError::Closed`] after [`shutdown`](Self::shutdown).
    pub fn append_doc(&self, doc: MessageDoc) -> Result<(), AppendError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(AppendError::Closed);
        }
        tracing::debug!(key = %doc.key, sender = %doc.sender_id, "appending message document");
        self.inner.messages.write().push(doc.clone());
        self.inner.subs.lock().fanout(&doc);
        Ok(())
    }

    /// Returns the number of stored message documents.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.messages.read().len()
    }

    // -- subscriptions ---------------------------------------------------

    /// Establishes a change-feed subscription for a query.
    ///
    /// The snapshot of currently matching documents is delivered as the
    /// first batch on the returned stream — one `Added` change per
    /// document, possibly an empty batch. Later batches carry incremental
    /// deltas in store-observation order.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError::EmptyFilter`] for a filter with no
    /// clauses, or [`SubscribeError::Closed`] after
    /// [`shutdown`](Self::shutdown).
    pub fn subscribe(&self, filter: Filter) -> Result<Subscription, SubscribeError> {
        if filter.is_empty() {
            return Err(SubscribeError::EmptyFilter);
        }
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SubscribeError::Closed);
        }

        // Holding the registry lock while snapshotting keeps concurrent
        // appends from slipping between snapshot and registration.
        let mut subs = self.inner.subs.lock();
        let snapshot: Vec<DocumentChange> = self
            .inner
            .messages
            .read()
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .map(DocumentChange::added)
            .collect();

        let snapshot_len = snapshot.len();
        let capacity = self.inner.subscription_capacity;
        let (id, rx) = subs.register(filter, capacity);
        subs.deliver_snapshot(id, ChangeBatch::new(snapshot));
        drop(subs);

        tracing::debug!(subscription = %id, snapshot_len, "subscription established");
        Ok(Subscription { id, rx })
    }

    /// Cancels a subscription; its change stream ends.
    ///
    /// Returns `true` if the subscription was live.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subs.lock().remove(id)
    }

    /// Returns the id and filter of every live subscription.
    #[must_use]
    pub fn active_subscriptions(&self) -> Vec<(SubscriptionId, Filter)> {
        self.inner.subs.lock().active()
    }

    /// Shuts the store down: rejects further appends and subscriptions and
    /// ends every live change stream.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.subs.lock().clear();
        tracing::info!("store shut down");
    }

    // -- users -----------------------------------------------------------

    /// Registers a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::EmailTaken`] if another profile already
    /// uses the same email.
    pub fn add_user(&self, profile: UserProfile) -> Result<(), UserStoreError> {
        let mut users = self.inner.users.write();
        if users.iter().any(|existing| existing.email == profile.email) {
            return Err(UserStoreError::EmailTaken(profile.email));
        }
        users.push(profile);
        Ok(())
    }

    /// Looks a user up by sign-in credentials (email + password digest).
    #[must_use]
    pub fn find_by_credentials(&self, email: &str, password_digest: &str) -> Option<UserProfile> {
        self.inner
            .users
            .read()
            .iter()
            .find(|user| user.email == email && user.password_digest == password_digest)
            .cloned()
    }

    /// Returns every registered user profile.
    #[must_use]
    pub fn list_users(&self) -> Vec<UserProfile> {
        self.inner.users.read().clone()
    }

    /// Returns the profile with the given id, if any.
    #[must_use]
    pub fn get_user(&self, id: &UserId) -> Option<UserProfile> {
        self.inner
            .users
            .read()
            .iter()
            .find(|user| &user.id == id)
            .cloned()
    }

    /// Sets or deletes a user's push-notification token.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::UnknownUser`] if no profile has this id.
    pub fn set_push_token(
        &self,
        id: &UserId,
        token: Option<String>,
    ) -> Result<(), UserStoreError> {
        let mut users = self.inner.users.write();
        match users.iter_mut().find(|user| &user.id == id) {
            Some(user) => {
                user.push_token = token;
                Ok(())
            }
            None => Err(UserStoreError::UnknownUser(id.clone())),
        }
    }
}
