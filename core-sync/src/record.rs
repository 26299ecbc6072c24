//! Directory records exchanged with the companion.
//!
//! Records are derived from session rows at sync time and never cached.

use crate::error::{Result, SyncError};
use bridge_traits::session::{FeedEntry, FriendInfo};
use serde::{Deserialize, Serialize};

/// A one-to-one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecord {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Username part of the host's `displayName|username` field
    pub handle: Option<String>,
    pub bitmoji_avatar_id: Option<String>,
    pub bitmoji_selfie_id: Option<String>,
}

/// A group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub conversation_id: String,
    pub name: String,
    pub participant_count: u32,
}

/// A record of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRecord {
    Friend(FriendRecord),
    Group(GroupRecord),
}

/// Extracts the handle from a `displayName|username` field.
///
/// Fields without a separator are taken as the handle itself.
pub fn parse_handle(display_username: &str) -> &str {
    display_username
        .split_once('|')
        .map_or(display_username, |(_, handle)| handle)
}

impl FriendRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<FriendInfo> for FriendRecord {
    fn from(info: FriendInfo) -> Self {
        Self {
            user_id: info.user_id,
            display_name: info.display_name,
            handle: info.username,
            bitmoji_avatar_id: info.bitmoji_avatar_id,
            bitmoji_selfie_id: info.bitmoji_selfie_id,
        }
    }
}

impl GroupRecord {
    /// Builds a group from a feed row. Rows without a key or a display name
    /// are rejected.
    pub fn from_feed_entry(entry: &FeedEntry) -> Result<Self> {
        let conversation_id = entry
            .key
            .clone()
            .ok_or_else(|| SyncError::MalformedRow("feed entry without key".to_string()))?;
        let name = entry.feed_display_name.clone().ok_or_else(|| {
            SyncError::MalformedRow(format!("feed entry {} without name", conversation_id))
        })?;
        Ok(Self {
            conversation_id,
            name,
            participant_count: entry.participants_size,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl DirectoryRecord {
    /// Classifies a feed row: rows carrying a friend id are friends,
    /// everything else is a group.
    pub fn from_feed_entry(entry: &FeedEntry) -> Result<Self> {
        match &entry.friend_user_id {
            Some(user_id) => Ok(DirectoryRecord::Friend(FriendRecord {
                user_id: user_id.clone(),
                display_name: entry.friend_display_name.clone(),
                handle: entry
                    .friend_display_username
                    .as_deref()
                    .map(|field| parse_handle(field).to_string()),
                bitmoji_avatar_id: entry.bitmoji_avatar_id.clone(),
                bitmoji_selfie_id: entry.bitmoji_selfie_id.clone(),
            })),
            None => GroupRecord::from_feed_entry(entry).map(DirectoryRecord::Group),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        match self {
            DirectoryRecord::Friend(friend) => friend.to_json(),
            DirectoryRecord::Group(group) => group.to_json(),
        }
    }
}
