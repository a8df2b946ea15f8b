//! Integration tests for the surrounding plumbing: accounts, directory,
//! push tokens, avatars — and a full two-client chat over one store.

use std::time::Duration;

use pairchat::auth::{self, NewUser};
use pairchat::avatar;
use pairchat::compose::Composer;
use pairchat::convo::{ConversationEvent, ConversationHandle, RenderInstruction};
use pairchat::directory;
use pairchat::notify::{self, StaticProvider};
use pairchat::session::SessionStore;
use pairchat_store::MemoryStore;

fn make_new_user(first: &str, email: &str) -> NewUser {
    NewUser {
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        email: email.to_string(),
        password: "long enough password".to_string(),
        avatar: None,
    }
}

/// Account creation, directory listing, and peer lookup work together.
#[test]
fn sign_up_populates_directory() {
    let store = MemoryStore::new();
    let ada = auth::sign_up(&store, make_new_user("Ada", "ada@example.com")).unwrap();
    let grace = auth::sign_up(&store, make_new_user("Grace", "grace@example.com")).unwrap();

    let peers = directory::list_peers(&store, &ada.user_id);
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].id, grace.user_id);

    let found = directory::find_peer(&store, &grace.user_id).unwrap();
    assert_eq!(found.display_name(), "Grace Tester");
}

/// The full device lifecycle: token registered at startup, deleted at
/// sign-out, with the persisted session removed too.
#[test]
fn token_and_session_lifecycle() {
    let store = MemoryStore::new();
    let session = auth::sign_up(&store, make_new_user("Ada", "ada@example.com")).unwrap();

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let sessions = SessionStore::new(
        std::env::temp_dir().join(format!("pairchat-auth-flow-{nanos}.toml")),
    );
    sessions.save(&session).unwrap();
    assert_eq!(sessions.load().unwrap().as_ref(), Some(&session));

    notify::register(&store, &StaticProvider::new("device-token"), &session.user_id).unwrap();
    assert_eq!(
        store
            .get_user(&session.user_id)
            .unwrap()
            .push_token
            .as_deref(),
        Some("device-token")
    );

    auth::sign_out(&store, &sessions, &session.user_id).unwrap();
    assert!(store.get_user(&session.user_id).unwrap().push_token.is_none());
    assert_eq!(sessions.load().unwrap(), None);
}

/// An avatar supplied at sign-up survives the store round trip and
/// decodes back to the original bytes.
#[test]
fn avatar_round_trips_through_profile() {
    let store = MemoryStore::new();
    let raw = vec![0x89, 0x50, 0x4e, 0x47, 0x01, 0x02, 0x03];
    let mut new_user = make_new_user("Ada", "ada@example.com");
    new_user.avatar = Some(avatar::encode(&raw).unwrap());

    let session = auth::sign_up(&store, new_user).unwrap();
    let stored = store.get_user(&session.user_id).unwrap();
    let encoded = stored.avatar.expect("avatar should be stored");
    assert_eq!(avatar::decode(&encoded).unwrap(), raw);
}

/// Two signed-up users chat through the store: each side's conversation
/// converges to the same ordered list, with the sender observing its own
/// message via the self-delivered change.
#[tokio::test]
async fn two_clients_converge_over_one_store() {
    let store = MemoryStore::new();
    let ada = auth::sign_up(&store, make_new_user("Ada", "ada@example.com")).unwrap();
    let grace = auth::sign_up(&store, make_new_user("Grace", "grace@example.com")).unwrap();

    let (ada_handle, mut ada_events) =
        ConversationHandle::open(&store, &ada.user_id, &grace.user_id, 16).unwrap();
    let (grace_handle, mut grace_events) =
        ConversationHandle::open(&store, &grace.user_id, &ada.user_id, 16).unwrap();

    let ada_composer = Composer::new(store.clone(), ada.user_id.clone());
    let grace_composer = Composer::new(store.clone(), grace.user_id.clone());

    ada_composer.send(&grace.user_id, "Hello, Grace!").unwrap();

    // Ada sees her own message via the outgoing channel's self-delivery;
    // it is her first contributing batch, so it arrives as a FullReset.
    match recv(&mut ada_events).await {
        ConversationEvent::Render(RenderInstruction::FullReset { messages, .. }) => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].body, "Hello, Grace!");
        }
        other => panic!("expected FullReset for ada, got {other:?}"),
    }
    // Grace sees it on her incoming channel the same way.
    match recv(&mut grace_events).await {
        ConversationEvent::Render(RenderInstruction::FullReset { messages, .. }) => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].body, "Hello, Grace!");
        }
        other => panic!("expected FullReset for grace, got {other:?}"),
    }

    // Keep the two sends in distinct milliseconds so the chronological
    // order under test is unambiguous.
    tokio::time::sleep(Duration::from_millis(5)).await;
    grace_composer.send(&ada.user_id, "Hi Ada!").unwrap();

    for events in [&mut ada_events, &mut grace_events] {
        match recv(events).await {
            ConversationEvent::Render(RenderInstruction::IncrementalAppend {
                messages, ..
            }) => {
                let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
                assert_eq!(bodies, vec!["Hello, Grace!", "Hi Ada!"]);
            }
            other => panic!("expected IncrementalAppend, got {other:?}"),
        }
    }

    ada_handle.close().await;
    grace_handle.close().await;
}

async fn recv(
    rx: &mut tokio::sync::mpsc::Receiver<ConversationEvent>,
) -> ConversationEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for conversation event")
        .expect("event stream ended unexpectedly")
}
