//! Subscription registry for query change feeds.
//!
//! Each live subscription pairs a [`Filter`] with the sending half of a
//! bounded channel. The store fans appended documents out to every
//! matching subscriber; a subscriber that cannot keep up (channel full) is
//! dropped rather than allowed to block the store, which the consumer
//! observes as its change stream ending.

use tokio::sync::mpsc;

use pairchat_proto::change::{ChangeBatch, Filter};
use pairchat_proto::document::MessageDoc;

/// Errors raised while establishing a subscription.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    /// The filter carries no clauses.
    #[error("cannot subscribe with an empty filter")]
    EmptyFilter,
    /// The store has been shut down.
    #[error("store is shut down")]
    Closed,
}

/// Identifies one live subscription within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live query subscription.
///
/// The first batch received on `rx` is the snapshot of all documents
/// matching the filter at establishment time (possibly empty); every
/// later batch is an incremental delta. The stream ending means the
/// subscription was cancelled, evicted as a slow consumer, or the store
/// shut down.
#[derive(Debug)]
pub struct Subscription {
    /// The registry handle for this subscription.
    pub id: SubscriptionId,
    /// The change stream.
    pub rx: mpsc::Receiver<ChangeBatch>,
}

/// One registered subscriber.
struct SubEntry {
    id: SubscriptionId,
    filter: Filter,
    tx: mpsc::Sender<ChangeBatch>,
}

/// Registry of live subscriptions, owned by the store behind its lock.
pub(crate) struct Registry {
    next_id: u64,
    entries: Vec<SubEntry>,
}

impl Registry {
    pub(crate) const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Registers a subscriber and returns its id plus the receiving half.
    pub(crate) fn register(
        &mut self,
        filter: Filter,
        capacity: usize,
    ) -> (SubscriptionId, mpsc::Receiver<ChangeBatch>) {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.entries.push(SubEntry { id, filter, tx });
        (id, rx)
    }

    /// Removes a subscriber; returns `true` if it was present.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() < before
    }

    /// Delivers the initial snapshot batch to a just-registered subscriber.
    ///
    /// The channel was created with at least one free slot, so this cannot
    /// fail for capacity reasons; a send error only means the receiver was
    /// already dropped, in which case the entry is pruned.
    pub(crate) fn deliver_snapshot(&mut self, id: SubscriptionId, batch: ChangeBatch) {
        let failed = self
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .is_some_and(|entry| entry.tx.try_send(batch).is_err());
        if failed {
            tracing::debug!(subscription = %id, "snapshot receiver already dropped");
            self.remove(id);
        }
    }

    /// Fans one appended document out to every matching subscriber.
    ///
    /// Subscribers whose channel is full or closed are dropped; their
    /// stream ends and the consumer is expected to treat that as a channel
    /// failure.
    pub(crate) fn fanout(&mut self, doc: &MessageDoc) {
        let mut dropped: Vec<SubscriptionId> = Vec::new();
        for entry in &self.entries {
            if !entry.filter.matches(doc) {
                continue;
            }
            let batch = ChangeBatch::new(vec![pairchat_proto::change::DocumentChange::added(
                doc.clone(),
            )]);
            match entry.tx.try_send(batch) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscription = %entry.id,
                        "dropping slow subscriber (channel full)"
                    );
                    dropped.push(entry.id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(subscription = %entry.id, "pruning closed subscriber");
                    dropped.push(entry.id);
                }
            }
        }
        for id in dropped {
            self.remove(id);
        }
    }

    /// Returns the id and filter of every live subscription.
    pub(crate) fn active(&self) -> Vec<(SubscriptionId, Filter)> {
        self.entries
            .iter()
            .map(|entry| (entry.id, entry.filter.clone()))
            .collect()
    }

    /// Drops every subscription, closing all change streams.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
