//! Property-based round-trip tests for the snapshot codec.
//!
//! Uses proptest to verify:
//! 1. Any snapshot survives an encode → decode round-trip.
//! 2. Random bytes never cause a panic in `decode_snapshot`.
//! 3. A flipped version byte is always rejected.

use proptest::prelude::*;

use pairchat_proto::codec::{self, FORMAT_VERSION, StoreSnapshot};
use pairchat_proto::document::{DocumentKey, MessageDoc, Timestamp, UserId};
use pairchat_proto::user::{EncodedImage, UserProfile};

// --- Strategies for model types ---

fn arb_user_id() -> impl Strategy<Value = UserId> {
    "[a-z0-9-]{1,36}".prop_map(UserId::new)
}

fn arb_document_key() -> impl Strategy<Value = DocumentKey> {
    "[a-z0-9-]{1,36}".prop_map(DocumentKey::new)
}

fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    any::<u64>().prop_map(Timestamp::from_millis)
}

fn arb_message_doc() -> impl Strategy<Value = MessageDoc> {
    (
        arb_document_key(),
        arb_user_id(),
        arb_user_id(),
        prop::option::of("[^\x00]{0,256}"),
        prop::option::of(arb_timestamp()),
    )
        .prop_map(|(key, sender_id, receiver_id, body, sent_at)| MessageDoc {
            key,
            sender_id,
            receiver_id,
            body,
            sent_at,
        })
}

fn arb_user_profile() -> impl Strategy<Value = UserProfile> {
    (
        arb_user_id(),
        "[A-Za-z]{1,16}",
        "[A-Za-z]{1,16}",
        "[a-z]{1,12}@[a-z]{1,12}\\.[a-z]{2,4}",
        "[0-9a-f]{64}",
        prop::option::of("[A-Za-z0-9+/=]{0,128}".prop_map(EncodedImage::new)),
        prop::option::of("[A-Za-z0-9:_-]{1,64}"),
    )
        .prop_map(
            |(id, first_name, last_name, email, password_digest, avatar, push_token)| {
                UserProfile {
                    id,
                    first_name,
                    last_name,
                    email,
                    password_digest,
                    avatar,
                    push_token,
                }
            },
        )
}

fn arb_snapshot() -> impl Strategy<Value = StoreSnapshot> {
    (
        prop::collection::vec(arb_message_doc(), 0..16),
        prop::collection::vec(arb_user_profile(), 0..8),
    )
        .prop_map(|(messages, users)| StoreSnapshot { messages, users })
}

// --- Property tests ---

proptest! {
    /// Any snapshot survives an encode → decode round-trip.
    #[test]
    fn snapshot_round_trip(snapshot in arb_snapshot()) {
        let bytes = codec::encode_snapshot(&snapshot).expect("encode should succeed");
        let decoded = codec::decode_snapshot(&bytes).expect("decode should succeed");
        prop_assert_eq!(snapshot, decoded);
    }

    /// Random bytes never cause a panic — they return Err or a valid value.
    #[test]
    fn random_bytes_decode_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode_snapshot(&bytes);
    }

    /// Any unknown version byte is rejected up front.
    #[test]
    fn wrong_version_is_rejected(snapshot in arb_snapshot(), bump in 1u8..255) {
        let mut bytes = codec::encode_snapshot(&snapshot).expect("encode should succeed");
        bytes[0] = FORMAT_VERSION.wrapping_add(bump);
        let is_unsupported_version = matches!(
            codec::decode_snapshot(&bytes),
            Err(codec::CodecError::UnsupportedVersion { .. })
        );
        prop_assert!(is_unsupported_version);
    }
}
