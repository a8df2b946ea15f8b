//! User directory: who can be chatted with.

use pairchat_proto::document::UserId;
use pairchat_proto::user::UserProfile;
use pairchat_store::MemoryStore;

/// Returns every registered user except the caller, sorted by display
/// name for stable listing.
///
/// An empty result is not an error; the UI shows a notice instead.
#[must_use]
pub fn list_peers(store: &MemoryStore, me: &UserId) -> Vec<UserProfile> {
    let mut peers: Vec<UserProfile> = store
        .list_users()
        .into_iter()
        .filter(|user| &user.id != me)
        .collect();
    peers.sort_by(|a, b| a.display_name().cmp(&b.display_name()));
    peers
}

/// Finds one peer by identity.
#[must_use]
pub fn find_peer(store: &MemoryStore, id: &UserId) -> Option<UserProfile> {
    store.get_user(id)
}
