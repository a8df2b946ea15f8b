//! Property-based tests for the conversation merge functions.
//!
//! Uses proptest to verify, for arbitrary two-channel delivery schedules:
//! 1. The final list is always sorted by `(sent_at, key)`.
//! 2. Every unique document appears exactly once.
//! 3. Batch partitioning never changes the final list.
//! 4. Delivering everything a second time changes nothing.

use proptest::prelude::*;

use pairchat::convo::ConversationState;
use pairchat::convo::merge::apply_batch;
use pairchat_proto::change::{ChangeBatch, DocumentChange};
use pairchat_proto::document::{DocumentKey, MessageDoc, Timestamp, UserId};

/// Build a document with a key derived from its index (unique, and with a
/// fixed width so lexicographic order matches numeric order).
fn make_doc(index: usize, timestamp: u64, to_peer: bool) -> MessageDoc {
    let (sender, receiver) = if to_peer { ("u1", "u2") } else { ("u2", "u1") };
    MessageDoc {
        key: DocumentKey::new(format!("k{index:03}")),
        sender_id: UserId::new(sender),
        receiver_id: UserId::new(receiver),
        body: Some(format!("message {index}")),
        sent_at: Some(Timestamp::from_millis(timestamp)),
    }
}

fn receipt() -> Timestamp {
    Timestamp::from_millis(999_999)
}

fn singleton(doc: MessageDoc) -> ChangeBatch {
    ChangeBatch::new(vec![DocumentChange::added(doc)])
}

/// Interleave two channel queues according to `order`, delivering each
/// document as its own batch; leftovers drain channel A first.
fn deliver_interleaved(
    state: &mut ConversationState,
    mut channel_a: Vec<MessageDoc>,
    mut channel_b: Vec<MessageDoc>,
    order: &[bool],
) {
    channel_a.reverse();
    channel_b.reverse();
    for take_a in order {
        let doc = if *take_a {
            channel_a.pop().or_else(|| channel_b.pop())
        } else {
            channel_b.pop().or_else(|| channel_a.pop())
        };
        if let Some(doc) = doc {
            apply_batch(state, &singleton(doc), receipt());
        }
    }
    while let Some(doc) = channel_a.pop() {
        apply_batch(state, &singleton(doc), receipt());
    }
    while let Some(doc) = channel_b.pop() {
        apply_batch(state, &singleton(doc), receipt());
    }
}

fn split_by_direction(docs: &[MessageDoc]) -> (Vec<MessageDoc>, Vec<MessageDoc>) {
    let to_peer: Vec<MessageDoc> = docs
        .iter()
        .filter(|doc| doc.sender_id == UserId::new("u1"))
        .cloned()
        .collect();
    let from_peer: Vec<MessageDoc> = docs
        .iter()
        .filter(|doc| doc.sender_id == UserId::new("u2"))
        .cloned()
        .collect();
    (to_peer, from_peer)
}

fn assert_sorted(state: &ConversationState) {
    assert!(
        state
            .messages()
            .windows(2)
            .all(|pair| pair[0].sort_key() <= pair[1].sort_key()),
        "messages must be sorted by (sent_at, key)"
    );
}

/// Strategy: a list of (timestamp, direction) pairs; the index gives each
/// document a unique key. Timestamps collide often (0..16) to exercise
/// the key tiebreak.
fn arb_docs() -> impl Strategy<Value = Vec<MessageDoc>> {
    prop::collection::vec((0u64..16, any::<bool>()), 1..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (timestamp, to_peer))| make_doc(index, timestamp, to_peer))
            .collect()
    })
}

proptest! {
    /// Any interleaving of the two channels yields the same sorted,
    /// complete, duplicate-free list.
    #[test]
    fn any_interleaving_yields_sorted_complete_list(
        docs in arb_docs(),
        order in prop::collection::vec(any::<bool>(), 0..80),
    ) {
        let (to_peer, from_peer) = split_by_direction(&docs);
        let mut state = ConversationState::new();
        deliver_interleaved(&mut state, to_peer, from_peer, &order);

        prop_assert_eq!(state.len(), docs.len());
        assert_sorted(&state);
    }

    /// Two different interleavings converge on the identical sequence.
    #[test]
    fn delivery_order_is_invisible_in_the_result(
        docs in arb_docs(),
        order_x in prop::collection::vec(any::<bool>(), 0..80),
        order_y in prop::collection::vec(any::<bool>(), 0..80),
    ) {
        let (to_peer, from_peer) = split_by_direction(&docs);

        let mut state_x = ConversationState::new();
        deliver_interleaved(&mut state_x, to_peer.clone(), from_peer.clone(), &order_x);

        let mut state_y = ConversationState::new();
        deliver_interleaved(&mut state_y, to_peer, from_peer, &order_y);

        prop_assert_eq!(state_x.messages(), state_y.messages());
    }

    /// One big batch and singleton batches produce the same list.
    #[test]
    fn batch_partitioning_does_not_matter(docs in arb_docs()) {
        let mut as_one = ConversationState::new();
        apply_batch(
            &mut as_one,
            &ChangeBatch::new(docs.iter().cloned().map(DocumentChange::added).collect()),
            receipt(),
        );

        let mut one_by_one = ConversationState::new();
        for doc in &docs {
            apply_batch(&mut one_by_one, &singleton(doc.clone()), receipt());
        }

        prop_assert_eq!(as_one.messages(), one_by_one.messages());
    }

    /// Replaying the entire delivery is a no-op (at-least-once safety).
    #[test]
    fn full_redelivery_changes_nothing(docs in arb_docs()) {
        let batch = ChangeBatch::new(docs.iter().cloned().map(DocumentChange::added).collect());

        let mut state = ConversationState::new();
        apply_batch(&mut state, &batch, receipt());
        let first_pass: Vec<_> = state.messages().to_vec();

        let added = apply_batch(&mut state, &batch, receipt());
        prop_assert_eq!(added, 0);
        prop_assert_eq!(state.messages(), &first_pass[..]);
    }
}
