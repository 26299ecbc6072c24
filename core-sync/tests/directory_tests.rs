//! Directory sync over a recording bridge and a mocked session store.

use async_trait::async_trait;
use bridge_traits::bridge::{BridgeClient, ConnectCallback, SyncCallback, BRIDGE_SYNC_ACTION};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::scripting::ScriptingInterface;
use bridge_traits::session::{FeedEntry, FriendInfo, SessionStore};
use bridge_traits::storage::FileStore;
use bytes::Bytes;
use core_runtime::events::{BroadcastReceiveEvent, Event, EventBus};
use core_sync::{Directory, DirectorySync, SessionSyncCallback};
use mockall::mock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mock! {
    Session {}

    impl SessionStore for Session {
        fn has_active_session(&self) -> bool;
        fn friend_info(&self, user_id: &str) -> BridgeResult<Option<FriendInfo>>;
        fn feed_entry(&self, conversation_id: &str) -> BridgeResult<Option<FeedEntry>>;
        fn feed_entries(&self, limit: usize) -> BridgeResult<Vec<FeedEntry>>;
    }
}

/// Records every bridge call the sync service makes.
struct RecordingBridge {
    registrations: Mutex<Vec<Arc<dyn SyncCallback>>>,
    pushes: mpsc::UnboundedSender<(Vec<String>, Vec<String>)>,
}

impl RecordingBridge {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(Vec<String>, Vec<String>)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(Self {
            registrations: Mutex::new(Vec::new()),
            pushes: tx,
        });
        (bridge, rx)
    }
}

#[async_trait]
impl BridgeClient for RecordingBridge {
    fn connect(&self, on_result: ConnectCallback) {
        on_result(true);
    }

    async fn register_sync(&self, callback: Arc<dyn SyncCallback>) -> BridgeResult<()> {
        self.registrations.lock().push(callback);
        Ok(())
    }

    async fn reload_config(&self) -> BridgeResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn fetch_translations(&self, _locale: &str) -> BridgeResult<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    async fn close_overlay(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn push_directory(&self, groups: Vec<String>, friends: Vec<String>) -> BridgeResult<()> {
        self.pushes
            .send((groups, friends))
            .map_err(|_| BridgeError::Disconnected)
    }

    fn files(&self) -> Arc<dyn FileStore> {
        unimplemented!("not used by directory sync")
    }

    fn scripting_interface(&self) -> BridgeResult<Arc<dyn ScriptingInterface>> {
        Err(BridgeError::NotAvailable("scripting".to_string()))
    }
}

fn alice_and_team() -> Vec<FeedEntry> {
    vec![
        FeedEntry {
            key: Some("c-alice".to_string()),
            friend_user_id: Some("f1".to_string()),
            friend_display_name: Some("Alice".to_string()),
            friend_display_username: Some("Alice|alice".to_string()),
            ..FeedEntry::default()
        },
        FeedEntry {
            key: Some("g1".to_string()),
            feed_display_name: Some("Team".to_string()),
            participants_size: 3,
            ..FeedEntry::default()
        },
    ]
}

fn session_with(rows: Vec<FeedEntry>) -> Arc<MockSession> {
    let mut session = MockSession::new();
    session
        .expect_feed_entries()
        .returning(move |_| Ok(rows.clone()));
    Arc::new(session)
}

#[tokio::test]
async fn test_push_scenario_partitions_friend_and_group() {
    let (bridge, mut pushes) = RecordingBridge::new();
    let bus = EventBus::new();
    let sync = DirectorySync::new(
        bridge.clone(),
        session_with(alice_and_team()),
        bus.clone(),
        tokio::runtime::Handle::current(),
    );
    sync.register().await.unwrap();

    let event = bus.post(BroadcastReceiveEvent::new(BRIDGE_SYNC_ACTION));
    assert!(event.is_canceled());

    let (groups, friends) = tokio::time::timeout(Duration::from_secs(5), pushes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(friends.len(), 1);

    let group: serde_json::Value = serde_json::from_str(&groups[0]).unwrap();
    assert_eq!(group["conversationId"], "g1");
    assert_eq!(group["name"], "Team");
    assert_eq!(group["participantCount"], 3);

    let friend: serde_json::Value = serde_json::from_str(&friends[0]).unwrap();
    assert_eq!(friend["userId"], "f1");
    assert_eq!(friend["displayName"], "Alice");
    assert_eq!(friend["handle"], "alice");
}

#[tokio::test]
async fn test_other_broadcasts_are_left_alone() {
    let (bridge, mut pushes) = RecordingBridge::new();
    let bus = EventBus::new();
    let sync = DirectorySync::new(
        bridge,
        session_with(alice_and_team()),
        bus.clone(),
        tokio::runtime::Handle::current(),
    );
    sync.register().await.unwrap();

    let event = bus.post(BroadcastReceiveEvent::new("host.widget.REFRESH"));
    assert!(!event.is_canceled());
    assert!(pushes.try_recv().is_err());
}

#[tokio::test]
async fn test_repeated_register_subscribes_once() {
    let (bridge, _pushes) = RecordingBridge::new();
    let bus = EventBus::new();
    let sync = DirectorySync::new(
        bridge.clone(),
        session_with(Vec::new()),
        bus.clone(),
        tokio::runtime::Handle::current(),
    );

    for _ in 0..3 {
        sync.register().await.unwrap();
    }

    assert!(sync.is_push_subscribed());
    assert_eq!(bus.subscriber_count::<BroadcastReceiveEvent>(), 1);
    assert_eq!(bridge.registrations.lock().len(), 3);
}

#[tokio::test]
async fn test_push_skips_malformed_rows() {
    let (bridge, mut pushes) = RecordingBridge::new();
    let mut rows = alice_and_team();
    rows.push(FeedEntry {
        key: Some("g-broken".to_string()),
        ..FeedEntry::default()
    });
    let sync = DirectorySync::new(
        bridge,
        session_with(rows),
        EventBus::new(),
        tokio::runtime::Handle::current(),
    );

    assert_eq!(sync.push().await.unwrap(), 2);
    let (groups, friends) = pushes.recv().await.unwrap();
    assert_eq!((groups.len(), friends.len()), (1, 1));
}

#[tokio::test]
async fn test_session_failure_is_not_pushed() {
    let (bridge, mut pushes) = RecordingBridge::new();
    let mut session = MockSession::new();
    session
        .expect_feed_entries()
        .returning(|_| Err(BridgeError::OperationFailed("db locked".to_string())));
    let sync = DirectorySync::new(
        bridge,
        Arc::new(session),
        EventBus::new(),
        tokio::runtime::Handle::current(),
    );

    assert!(sync.push().await.is_err());
    assert!(pushes.try_recv().is_err());
}

#[test]
fn test_pull_callback_lookups() {
    let mut session = MockSession::new();
    session.expect_friend_info().returning(|id| {
        Ok((id == "f1").then(|| FriendInfo {
            user_id: "f1".to_string(),
            display_name: Some("Alice".to_string()),
            username: Some("alice".to_string()),
            ..FriendInfo::default()
        }))
    });
    session.expect_feed_entry().returning(|id| {
        Ok(match id {
            "g1" => Some(FeedEntry {
                key: Some("g1".to_string()),
                feed_display_name: Some("Team".to_string()),
                participants_size: 3,
                ..FeedEntry::default()
            }),
            "broken" => Some(FeedEntry::default()),
            _ => None,
        })
    });
    let callback = SessionSyncCallback::new(Arc::new(session));

    let friend = callback.sync_friend("f1").unwrap().unwrap();
    assert!(friend.contains(r#""handle":"alice""#));
    assert_eq!(callback.sync_friend("nobody").unwrap(), None);

    let group = callback.sync_group("g1").unwrap().unwrap();
    assert!(group.contains(r#""participantCount":3"#));
    assert_eq!(callback.sync_group("broken").unwrap(), None);
    assert_eq!(callback.sync_group("missing").unwrap(), None);
}

#[test]
fn test_directory_collect_preserves_order() {
    let session = session_with(vec![
        FeedEntry {
            key: Some("g1".to_string()),
            feed_display_name: Some("One".to_string()),
            ..FeedEntry::default()
        },
        FeedEntry {
            key: Some("g2".to_string()),
            feed_display_name: Some("Two".to_string()),
            ..FeedEntry::default()
        },
    ]);

    let directory = Directory::collect(session.as_ref()).unwrap();
    let names: Vec<_> = directory.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
    assert!(directory.friends.is_empty());
}
