//! Integration tests for the store's change-feed contract:
//! snapshot-then-incremental delivery, per-subscription ordering,
//! slow-consumer eviction, and snapshot persistence.

use std::time::Duration;

use pairchat_proto::change::{ChangeKind, Filter};
use pairchat_proto::document::{UserId, WriteRequest};
use pairchat_store::{MemoryStore, persist};

fn make_request(sender: &str, receiver: &str, body: &str) -> WriteRequest {
    WriteRequest {
        sender_id: UserId::new(sender),
        receiver_id: UserId::new(receiver),
        body: body.to_string(),
    }
}

fn direction(sender: &str, receiver: &str) -> Filter {
    Filter::direction(&UserId::new(sender), &UserId::new(receiver))
}

/// The first delivery is always the full snapshot; deltas follow, one
/// per append, in append order.
#[tokio::test]
async fn snapshot_then_ordered_deltas() {
    let store = MemoryStore::new();
    store.append(&make_request("u1", "u2", "one")).unwrap();
    store.append(&make_request("u1", "u2", "two")).unwrap();

    let mut sub = store.subscribe(direction("u1", "u2")).unwrap();

    let snapshot = sub.rx.recv().await.expect("snapshot batch");
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.changes().iter().all(|c| c.kind == ChangeKind::Added));

    for body in ["three", "four", "five"] {
        store.append(&make_request("u1", "u2", body)).unwrap();
    }
    for expected in ["three", "four", "five"] {
        let batch = sub.rx.recv().await.expect("delta batch");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.changes()[0].doc.body.as_deref(), Some(expected));
    }
}

/// Store-assigned timestamps are present and monotonically non-decreasing
/// in append order.
#[tokio::test]
async fn append_assigns_non_decreasing_timestamps() {
    let store = MemoryStore::new();
    for i in 0..5 {
        store
            .append(&make_request("u1", "u2", &format!("m{i}")))
            .unwrap();
    }
    let snapshot = store.snapshot();
    let stamps: Vec<u64> = snapshot
        .messages
        .iter()
        .map(|doc| doc.sent_at.expect("store assigns sent_at").as_millis())
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

/// A subscriber that stops draining is evicted instead of blocking the
/// store; its stream ends after the already-queued batches.
#[tokio::test]
async fn slow_subscriber_is_evicted() {
    let store = MemoryStore::with_subscription_capacity(1);
    let mut sub = store.subscribe(direction("u1", "u2")).unwrap();
    // The empty snapshot occupies the single slot until drained; drain it
    // so exactly one delta fits.
    let snapshot = sub.rx.recv().await.expect("snapshot batch");
    assert!(snapshot.is_empty());

    store.append(&make_request("u1", "u2", "fits")).unwrap();
    // Channel now full; this delivery evicts the subscriber.
    store.append(&make_request("u1", "u2", "evicts")).unwrap();

    assert!(store.active_subscriptions().is_empty());

    let queued = sub.rx.recv().await.expect("queued batch");
    assert_eq!(queued.changes()[0].doc.body.as_deref(), Some("fits"));
    assert!(
        tokio::time::timeout(Duration::from_secs(1), sub.rx.recv())
            .await
            .expect("timed out")
            .is_none(),
        "stream must end after eviction"
    );
}

/// Other subscribers are unaffected when one is evicted.
#[tokio::test]
async fn eviction_is_per_subscriber() {
    let store = MemoryStore::with_subscription_capacity(1);
    let mut slow = store.subscribe(direction("u1", "u2")).unwrap();
    let mut healthy = store.subscribe(direction("u1", "u2")).unwrap();

    // Drain both snapshots, then let only `healthy` keep draining.
    let _ = slow.rx.recv().await.expect("snapshot");
    let _ = healthy.rx.recv().await.expect("snapshot");

    store.append(&make_request("u1", "u2", "first")).unwrap();
    let _ = healthy.rx.recv().await.expect("first delta");
    store.append(&make_request("u1", "u2", "second")).unwrap();
    let batch = healthy.rx.recv().await.expect("second delta");
    assert_eq!(batch.changes()[0].doc.body.as_deref(), Some("second"));

    // Only the healthy subscription survives.
    let active = store.active_subscriptions();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].0, healthy.id);
    drop(slow);
}

/// Persisting and restoring a store preserves documents, and fresh
/// subscriptions against the restored store see them as their snapshot.
#[tokio::test]
async fn persisted_store_serves_restored_snapshots() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("pairchat-store-feed-{nanos}.bin"));

    let store = MemoryStore::new();
    store.append(&make_request("u1", "u2", "durable")).unwrap();
    persist::save(&store, &path).unwrap();

    let restored = persist::load(&path, 16).unwrap();
    let mut sub = restored.subscribe(direction("u1", "u2")).unwrap();
    let snapshot = sub.rx.recv().await.expect("snapshot batch");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.changes()[0].doc.body.as_deref(), Some("durable"));

    let _ = std::fs::remove_file(&path);
}
