//! Integration tests for conversation lifecycle: open, close, drop.

use std::time::Duration;

use pairchat::convo::{ConversationEvent, ConversationHandle};
use pairchat_proto::document::{DocumentKey, MessageDoc, Timestamp, UserId};
use pairchat_store::MemoryStore;

fn make_doc(key: &str, sender: &UserId, receiver: &UserId, sent_at: u64) -> MessageDoc {
    MessageDoc {
        key: DocumentKey::new(key),
        sender_id: sender.clone(),
        receiver_id: receiver.clone(),
        body: Some("body".to_string()),
        sent_at: Some(Timestamp::from_millis(sent_at)),
    }
}

/// Opening establishes exactly two subscriptions, one per direction.
#[tokio::test]
async fn open_establishes_two_subscriptions() {
    let store = MemoryStore::new();
    let (u1, u2) = (UserId::new("u1"), UserId::new("u2"));
    let (handle, _events) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();

    assert_eq!(store.active_subscriptions().len(), 2);
    assert_eq!(handle.local_id(), &u1);
    assert_eq!(handle.peer_id(), &u2);

    handle.close().await;
}

/// Two conversations over the same store do not interfere.
#[tokio::test]
async fn conversations_are_isolated_per_pair() {
    let store = MemoryStore::new();
    let (u1, u2, u3) = (UserId::new("u1"), UserId::new("u2"), UserId::new("u3"));

    let (handle_a, mut events_a) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();
    let (handle_b, mut events_b) = ConversationHandle::open(&store, &u1, &u3, 16).unwrap();

    store.append_doc(make_doc("k1", &u2, &u1, 100)).unwrap();

    // Conversation A sees it; conversation B stays silent.
    assert!(matches!(
        tokio::time::timeout(Duration::from_secs(2), events_a.recv())
            .await
            .expect("timed out")
            .expect("stream ended"),
        ConversationEvent::Render(_)
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events_b.try_recv().is_err());

    handle_a.close().await;
    handle_b.close().await;
}

/// After close() returns, both subscriptions are gone and no further
/// events are ever delivered.
#[tokio::test]
async fn close_releases_subscriptions_and_ends_events() {
    let store = MemoryStore::new();
    let (u1, u2) = (UserId::new("u1"), UserId::new("u2"));
    let (handle, mut events) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();

    handle.close().await;
    assert!(store.active_subscriptions().is_empty());

    store.append_doc(make_doc("k1", &u2, &u1, 100)).unwrap();
    assert!(
        tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out")
            .is_none(),
        "event stream must end after close"
    );
}

/// Batches still queued when close is signaled are discarded, not
/// half-applied: the event stream just ends.
#[tokio::test]
async fn queued_batches_are_discarded_on_close() {
    let store = MemoryStore::new();
    let (u1, u2) = (UserId::new("u1"), UserId::new("u2"));
    // Tiny event buffer so the actor blocks emitting while more batches
    // queue up behind it.
    let (handle, mut events) = ConversationHandle::open(&store, &u1, &u2, 1).unwrap();

    for i in 0..10u64 {
        store
            .append_doc(make_doc(&format!("k{i}"), &u2, &u1, 100 + i))
            .unwrap();
    }

    // Close without draining. The actor must terminate promptly even
    // though the event channel is full and batches are still queued.
    handle.close().await;

    // Whatever was emitted before the close signal is still readable;
    // after that the stream ends. Nothing hangs, nothing panics.
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(200), events.recv()).await {}
    assert!(store.active_subscriptions().is_empty());
}

/// Dropping the handle (without close) also stops the actor; the store
/// prunes the dead receivers on its next fan-out.
#[tokio::test]
async fn dropped_handle_cancels_actor() {
    let store = MemoryStore::new();
    let (u1, u2) = (UserId::new("u1"), UserId::new("u2"));
    let (handle, _events) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();

    drop(handle);
    // Give the actor a moment to observe the dropped close signal.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The fan-out hits closed receivers and prunes both subscriptions.
    store.append_doc(make_doc("k1", &u2, &u1, 100)).unwrap();
    store.append_doc(make_doc("k2", &u1, &u2, 200)).unwrap();
    assert!(store.active_subscriptions().is_empty());
}

/// A conversation can be reopened after close and sees the full history
/// again as a fresh backfill.
#[tokio::test]
async fn reopen_after_close_backfills_again() {
    let store = MemoryStore::new();
    let (u1, u2) = (UserId::new("u1"), UserId::new("u2"));
    store.append_doc(make_doc("k1", &u2, &u1, 100)).unwrap();

    let (handle, mut events) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();
    let first = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out")
        .expect("stream ended");
    assert!(matches!(first, ConversationEvent::Render(_)));
    handle.close().await;

    let (handle, mut events) = ConversationHandle::open(&store, &u1, &u2, 16).unwrap();
    match tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out")
        .expect("stream ended")
    {
        ConversationEvent::Render(instruction) => {
            assert_eq!(instruction.messages().len(), 1);
        }
        other => panic!("expected a render instruction, got {other:?}"),
    }
    handle.close().await;
}
