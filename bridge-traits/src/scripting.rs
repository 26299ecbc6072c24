//! Scripting Runtime Contracts

use async_trait::async_trait;
use std::sync::Arc;

use crate::{error::Result, host::ForegroundEntry};

/// Companion-side scripting interface handed out by the bridge.
pub trait ScriptingInterface: Send + Sync {
    /// Names of the scripts the user enabled
    fn enabled_scripts(&self) -> Result<Vec<String>>;
}

/// In-process runtime hosting the user's scripting modules.
#[async_trait]
pub trait ScriptRuntime: Send + Sync {
    /// Connects the runtime to the companion and loads enabled modules.
    async fn connect(&self, interface: Arc<dyn ScriptingInterface>) -> Result<()>;

    /// Whether `connect` has completed.
    fn is_connected(&self) -> bool;

    /// Notifies every loaded module that a foreground entry point is ready.
    fn notify_foreground(&self, entry: &dyn ForegroundEntry);
}
