//! Change-feed types for store subscriptions.
//!
//! A subscription against the store delivers [`ChangeBatch`]es: the first
//! delivery is a snapshot of every currently matching document as a burst
//! of [`ChangeKind::Added`] changes (possibly an empty batch), and every
//! later delivery is an incremental delta. Delivery is at-least-once per
//! individual change; ordering is guaranteed only within one
//! subscription's batches, never across two subscriptions.

use serde::{Deserialize, Serialize};

use crate::document::{MessageDoc, UserId};

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A document entered the query result set.
    Added,
    /// A document in the result set was rewritten.
    Modified,
    /// A document left the result set.
    Removed,
}

/// One document-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChange {
    /// What happened.
    pub kind: ChangeKind,
    /// The document in its state at notification time.
    pub doc: MessageDoc,
}

impl DocumentChange {
    /// Convenience constructor for an `Added` change.
    #[must_use]
    pub const fn added(doc: MessageDoc) -> Self {
        Self {
            kind: ChangeKind::Added,
            doc,
        }
    }
}

/// An ordered group of document changes delivered together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch(pub Vec<DocumentChange>);

impl ChangeBatch {
    /// Creates a batch from a list of changes.
    #[must_use]
    pub const fn new(changes: Vec<DocumentChange>) -> Self {
        Self(changes)
    }

    /// Returns the changes in delivery order.
    #[must_use]
    pub fn changes(&self) -> &[DocumentChange] {
        &self.0
    }

    /// Returns the number of changes in this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the batch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A document field that can appear in an equality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterField {
    /// Match on `sender_id`.
    SenderId,
    /// Match on `receiver_id`.
    ReceiverId,
}

/// One `field == value` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    /// The field to compare.
    pub field: FilterField,
    /// The value it must equal.
    pub value: UserId,
}

/// A conjunctive equality filter over message documents.
///
/// The store supports only AND-composed equality clauses — no OR. This is
/// why one logical conversation needs two subscriptions, one per
/// direction; [`Filter::direction`] builds the filter for one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter(Vec<FilterClause>);

impl Filter {
    /// Creates a filter from explicit clauses.
    #[must_use]
    pub const fn new(clauses: Vec<FilterClause>) -> Self {
        Self(clauses)
    }

    /// Builds the filter matching messages sent by `sender` to `receiver`.
    #[must_use]
    pub fn direction(sender: &UserId, receiver: &UserId) -> Self {
        Self(vec![
            FilterClause {
                field: FilterField::SenderId,
                value: sender.clone(),
            },
            FilterClause {
                field: FilterField::ReceiverId,
                value: receiver.clone(),
            },
        ])
    }

    /// Returns the clauses of this filter.
    #[must_use]
    pub fn clauses(&self) -> &[FilterClause] {
        &self.0
    }

    /// Returns `true` if the filter has no clauses (matches nothing valid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tests whether a document satisfies every clause.
    #[must_use]
    pub fn matches(&self, doc: &MessageDoc) -> bool {
        self.0.iter().all(|clause| match clause.field {
            FilterField::SenderId => doc.sender_id == clause.value,
            FilterField::ReceiverId => doc.receiver_id == clause.value,
        })
    }
}
