//! # Directory Sync
//!
//! Republishes the host's friends and groups to the companion service.
//!
//! ## Modes
//!
//! - **Pull**: a [`SyncCallback`] answering single-record lookups issued by
//!   the companion, registered through [`BridgeClient::register_sync`].
//! - **Push**: when the companion broadcasts [`BRIDGE_SYNC_ACTION`] into the
//!   host, the broadcast is canceled and the whole directory is sent back
//!   with [`BridgeClient::push_directory`].
//!
//! [`DirectorySync::register`] may run on every resume. The pull callback is
//! re-registered each time; the push subscription is installed only once.

use crate::error::{Result, SyncError};
use crate::record::{DirectoryRecord, FriendRecord, GroupRecord};
use bridge_traits::bridge::{BridgeClient, SyncCallback, BRIDGE_SYNC_ACTION};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::session::SessionStore;
use core_async::runtime::Handle;
use core_async::task::JoinHandle;
use core_runtime::events::{BroadcastReceiveEvent, Event, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Snapshot of the local directory, partitioned by record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub groups: Vec<GroupRecord>,
    pub friends: Vec<FriendRecord>,
}

impl Directory {
    /// Reads every feed row. Malformed rows are skipped with a warning.
    pub fn collect(session: &dyn SessionStore) -> Result<Self> {
        let mut directory = Directory::default();
        for entry in session.feed_entries(usize::MAX)? {
            match DirectoryRecord::from_feed_entry(&entry) {
                Ok(DirectoryRecord::Friend(friend)) => directory.friends.push(friend),
                Ok(DirectoryRecord::Group(group)) => directory.groups.push(group),
                Err(e) => warn!(error = %e, "Skipping feed entry"),
            }
        }
        Ok(directory)
    }

    /// Serialized groups and friends, in feed order.
    pub fn to_json(&self) -> Result<(Vec<String>, Vec<String>)> {
        let groups = self
            .groups
            .iter()
            .map(GroupRecord::to_json)
            .collect::<Result<Vec<_>>>()?;
        let friends = self
            .friends
            .iter()
            .map(FriendRecord::to_json)
            .collect::<Result<Vec<_>>>()?;
        Ok((groups, friends))
    }
}

/// Pull-mode lookups backed by the host session store.
pub struct SessionSyncCallback {
    session: Arc<dyn SessionStore>,
}

impl SessionSyncCallback {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

impl SyncCallback for SessionSyncCallback {
    fn sync_friend(&self, user_id: &str) -> BridgeResult<Option<String>> {
        self.session
            .friend_info(user_id)?
            .map(|info| serde_json::to_string(&FriendRecord::from(info)))
            .transpose()
            .map_err(BridgeError::from)
    }

    fn sync_group(&self, conversation_id: &str) -> BridgeResult<Option<String>> {
        let Some(entry) = self.session.feed_entry(conversation_id)? else {
            return Ok(None);
        };
        match GroupRecord::from_feed_entry(&entry) {
            Ok(group) => Ok(Some(serde_json::to_string(&group)?)),
            Err(e) => {
                warn!(error = %e, "Group lookup hit a malformed row");
                Ok(None)
            }
        }
    }
}

/// Directory sync service.
pub struct DirectorySync {
    bridge: Arc<dyn BridgeClient>,
    session: Arc<dyn SessionStore>,
    events: EventBus,
    runtime: Handle,
    push_subscribed: AtomicBool,
}

impl DirectorySync {
    pub fn new(
        bridge: Arc<dyn BridgeClient>,
        session: Arc<dyn SessionStore>,
        events: EventBus,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            session,
            events,
            runtime,
            push_subscribed: AtomicBool::new(false),
        })
    }

    /// Installs both sync modes.
    ///
    /// Pull registration runs on the background runtime; the returned handle
    /// resolves once the companion acknowledged it.
    pub fn register(self: &Arc<Self>) -> JoinHandle<()> {
        self.subscribe_push();

        let sync = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = sync.register_pull().await {
                warn!(error = %e, "Directory sync registration failed");
            }
        })
    }

    /// Registers the pull callback with the companion.
    pub async fn register_pull(&self) -> Result<()> {
        let callback = Arc::new(SessionSyncCallback::new(Arc::clone(&self.session)));
        self.bridge.register_sync(callback).await?;
        debug!("Directory pull callback registered");
        Ok(())
    }

    fn subscribe_push(self: &Arc<Self>) {
        if self.push_subscribed.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        self.events.subscribe(move |event: &mut BroadcastReceiveEvent| {
            if event.action != BRIDGE_SYNC_ACTION {
                return;
            }
            event.cancel();

            let Some(sync) = weak.upgrade() else {
                return;
            };
            let runtime = sync.runtime.clone();
            runtime.spawn(async move {
                if let Err(e) = sync.push().await {
                    warn!(error = %e, "Directory push failed");
                }
            });
        });
    }

    /// Pushes the full directory. Returns the number of records sent.
    pub async fn push(&self) -> Result<usize> {
        let directory = Directory::collect(self.session.as_ref())?;
        let (groups, friends) = directory.to_json()?;
        let total = groups.len() + friends.len();

        self.bridge
            .push_directory(groups, friends)
            .await
            .map_err(SyncError::from)?;

        info!(
            groups = directory.groups.len(),
            friends = directory.friends.len(),
            "Directory pushed"
        );
        Ok(total)
    }

    pub fn is_push_subscribed(&self) -> bool {
        self.push_subscribed.load(Ordering::SeqCst)
    }
}
