//! # Directory Sync Module
//!
//! Keeps the companion service's view of the host's friends and groups
//! current.
//!
//! ## Components
//!
//! - **Records** (`record`): friend and group records derived from session rows
//! - **Directory Sync** (`directory`): pull-mode lookups and push-mode
//!   broadcasts over the bridge

pub mod directory;
pub mod error;
pub mod record;

pub use directory::{Directory, DirectorySync, SessionSyncCallback};
pub use error::{Result, SyncError};
pub use record::{parse_handle, DirectoryRecord, FriendRecord, GroupRecord};
