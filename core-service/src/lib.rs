//! Core service façade and bootstrap orchestration.
//!
//! This crate wires host-provided bridge implementations (companion client,
//! session store, symbol scanner, native layer, scripting runtime) into the
//! shared core and drives the attach sequence:
//!
//! ```text
//!   attach ── probe companion ── connect ──┬── failed ─> soft restart
//!                                          └── init sequence
//!                                                ├── mappings stale ─> MappingsMissing
//!                                                └── features, sync, scripts ─> Ready
//! ```
//!
//! Host lifecycle callbacks reach the orchestrator through the hooks that
//! [`Bootstrap::install_hooks`] registers. All of them are no-ops until the
//! init sequence has completed.

pub mod actions;
pub mod error;
pub mod features;
pub mod native;
pub mod orchestrator;
pub mod scope;
pub mod setup;
pub mod state;

pub use actions::{ActionManager, ACTION_EXTRA};
pub use error::{CoreError, ErrorKind, Result};
pub use features::{Feature, FeatureContext, FeatureSet};
pub use orchestrator::Bootstrap;
pub use scope::{ClassCache, ProcessScope};
pub use setup::{ScreenFactory, SetupRequirements, SetupStep, SetupWizard, WizardStep};
pub use state::BootstrapState;

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    bridge::BridgeClient,
    error::Result as BridgeResult,
    host::HostContext,
    native::NativeBridge,
    scanner::SymbolScanner,
    scripting::ScriptRuntime,
    session::SessionStore,
};
use core_async::runtime::Handle;
use core_runtime::config::ModConfig;

/// Package name probed at attach when none is configured.
pub const DEFAULT_COMPANION_PACKAGE: &str = "hookbridge.companion";

/// Creates the companion client for an attached host.
pub trait BridgeFactory: Send + Sync {
    fn create(&self, host: Arc<dyn HostContext>) -> BridgeResult<Arc<dyn BridgeClient>>;
}

impl<F> BridgeFactory for F
where
    F: Fn(Arc<dyn HostContext>) -> BridgeResult<Arc<dyn BridgeClient>> + Send + Sync,
{
    fn create(&self, host: Arc<dyn HostContext>) -> BridgeResult<Arc<dyn BridgeClient>> {
        self(host)
    }
}

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub bridge_factory: Arc<dyn BridgeFactory>,
    pub session: Arc<dyn SessionStore>,
    pub scanner: Arc<dyn SymbolScanner>,
    pub scripts: Arc<dyn ScriptRuntime>,
    pub native: Option<Arc<dyn NativeBridge>>,
    /// Background runtime for everything that must not block host threads
    pub runtime: Handle,
    pub companion_package: String,
    /// Configuration in effect until the companion provides one
    pub config: ModConfig,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        bridge_factory: Arc<dyn BridgeFactory>,
        session: Arc<dyn SessionStore>,
        scanner: Arc<dyn SymbolScanner>,
        scripts: Arc<dyn ScriptRuntime>,
        runtime: Handle,
    ) -> Self {
        Self {
            bridge_factory,
            session,
            scanner,
            scripts,
            native: None,
            runtime,
            companion_package: DEFAULT_COMPANION_PACKAGE.to_string(),
            config: ModConfig::default(),
        }
    }

    pub fn with_native(mut self, native: Arc<dyn NativeBridge>) -> Self {
        self.native = Some(native);
        self
    }

    pub fn with_companion_package(mut self, package: impl Into<String>) -> Self {
        self.companion_package = package.into();
        self
    }

    pub fn with_config(mut self, config: ModConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for CoreDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreDependencies")
            .field("companion_package", &self.companion_package)
            .field("native", &self.native.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
