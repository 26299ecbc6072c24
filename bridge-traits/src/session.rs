//! Local Session Storage
//!
//! Read-only view of the host's local session database (feed and friend
//! tables). Rows are returned as the host stores them; fields the host may
//! leave empty are optional.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the host's conversation feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Conversation identifier
    pub key: Option<String>,
    pub feed_display_name: Option<String>,
    pub participants_size: u32,
    /// Set for one-to-one conversations
    pub friend_user_id: Option<String>,
    pub friend_display_name: Option<String>,
    /// `displayName|username` as stored by the host
    pub friend_display_username: Option<String>,
    pub bitmoji_avatar_id: Option<String>,
    pub bitmoji_selfie_id: Option<String>,
}

/// One row of the host's friend table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInfo {
    pub user_id: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bitmoji_avatar_id: Option<String>,
    pub bitmoji_selfie_id: Option<String>,
}

/// Read-only session storage.
pub trait SessionStore: Send + Sync {
    /// Whether a user session is active (the messaging store exists)
    fn has_active_session(&self) -> bool;

    fn friend_info(&self, user_id: &str) -> Result<Option<FriendInfo>>;

    fn feed_entry(&self, conversation_id: &str) -> Result<Option<FeedEntry>>;

    /// Most recent feed entries, at most `limit`
    fn feed_entries(&self, limit: usize) -> Result<Vec<FeedEntry>>;
}
