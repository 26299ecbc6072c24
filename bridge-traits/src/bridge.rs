//! Companion Service Channel
//!
//! The bridge is the async RPC channel between code running inside the host
//! process and the privileged companion service. Connection is callback
//! based: [`BridgeClient::connect`] returns immediately and the callback fires
//! later on a thread owned by the client.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{error::Result, scripting::ScriptingInterface, storage::FileStore};

/// Broadcast action the companion sends when it wants the full directory
/// pushed back.
pub const BRIDGE_SYNC_ACTION: &str = "hookbridge.bridge.SYNC";

/// Completion callback for [`BridgeClient::connect`]. Receives `true` when
/// the handshake succeeded.
pub type ConnectCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Directory lookups the companion service issues on demand.
///
/// `Ok(None)` means the record does not exist; `Err` means the lookup itself
/// failed and must be reported as such across the bridge.
pub trait SyncCallback: Send + Sync {
    /// Serialized friend record for `user_id`.
    fn sync_friend(&self, user_id: &str) -> Result<Option<String>>;

    /// Serialized group record for `conversation_id`.
    fn sync_group(&self, conversation_id: &str) -> Result<Option<String>>;
}

/// Client side of the companion service channel.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::bridge::BridgeClient;
///
/// fn start(client: &dyn BridgeClient) {
///     client.connect(Box::new(|connected| {
///         if !connected {
///             eprintln!("companion unreachable");
///         }
///     }));
/// }
/// ```
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Starts the asynchronous handshake. Must not block.
    fn connect(&self, on_result: ConnectCallback);

    /// Registers the directory lookup callback. Registering again replaces
    /// the previous callback on the companion side.
    async fn register_sync(&self, callback: Arc<dyn SyncCallback>) -> Result<()>;

    /// Fetches the current configuration document (JSON).
    async fn reload_config(&self) -> Result<Bytes>;

    /// Fetches the translation table for `locale`.
    async fn fetch_translations(&self, locale: &str) -> Result<HashMap<String, String>>;

    /// Asks the companion to close any overlay it is displaying.
    async fn close_overlay(&self) -> Result<()>;

    /// Pushes the full directory as serialized group and friend records.
    async fn push_directory(&self, groups: Vec<String>, friends: Vec<String>) -> Result<()>;

    /// Files stored by the companion on behalf of the host process.
    fn files(&self) -> Arc<dyn FileStore>;

    /// Handle to the companion's scripting interface.
    fn scripting_interface(&self) -> Result<Arc<dyn ScriptingInterface>>;
}
