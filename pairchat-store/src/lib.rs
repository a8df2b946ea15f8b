//! `PairChat` — in-process document store with change-feed subscriptions.

pub mod persist;
pub mod store;
pub mod subscribe;

pub use store::{AppendError, MemoryStore, UserStoreError};
pub use subscribe::{SubscribeError, Subscription, SubscriptionId};
