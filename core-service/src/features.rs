//! Feature modules.
//!
//! A feature resolves its host symbols through the mapping cache during
//! [`Feature::init`]. A feature that fails to initialize is disabled on its
//! own; the rest of the set keeps running.

use crate::actions::ActionManager;
use crate::error::Result;
use crate::scope::ClassCache;
use bridge_traits::host::ForegroundEntry;
use core_mappings::MappingCache;
use core_runtime::config::ConfigHandle;
use core_runtime::events::EventBus;
use core_runtime::translation::Translations;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared services handed to every feature.
#[derive(Clone)]
pub struct FeatureContext {
    pub mappings: Arc<MappingCache>,
    pub events: EventBus,
    pub config: Arc<ConfigHandle>,
    pub translations: Arc<Translations>,
    pub classes: Arc<ClassCache>,
    pub actions: Arc<ActionManager>,
}

impl fmt::Debug for FeatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureContext")
            .field("mappings", &self.mappings.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

pub trait Feature: Send + Sync {
    fn name(&self) -> &str;

    /// Resolves symbols, installs event subscriptions and registers actions.
    fn init(&self, ctx: &FeatureContext) -> Result<()>;

    /// Called once when the first host foreground entry is created.
    fn on_foreground_ready(&self, _ctx: &FeatureContext, _entry: &dyn ForegroundEntry) {}
}

/// Registered features and the subset that initialized.
#[derive(Default)]
pub struct FeatureSet {
    registered: RwLock<Vec<Arc<dyn Feature>>>,
    active: RwLock<Vec<Arc<dyn Feature>>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, feature: Arc<dyn Feature>) {
        self.registered.write().push(feature);
    }

    /// Initializes every registered feature in registration order. Returns
    /// the number that initialized.
    pub fn init_all(&self, ctx: &FeatureContext) -> usize {
        let registered = self.registered.read().clone();
        let mut active = Vec::with_capacity(registered.len());

        for feature in registered {
            match feature.init(ctx) {
                Ok(()) => {
                    debug!(feature = feature.name(), "Feature initialized");
                    active.push(feature);
                }
                Err(e) => warn!(
                    feature = feature.name(),
                    error = %e,
                    kind = ?e.kind(),
                    "Feature disabled"
                ),
            }
        }

        let count = active.len();
        *self.active.write() = active;
        count
    }

    pub fn on_foreground_ready(&self, ctx: &FeatureContext, entry: &dyn ForegroundEntry) {
        let active = self.active.read().clone();
        for feature in active {
            feature.on_foreground_ready(ctx, entry);
        }
    }

    pub fn registered_len(&self) -> usize {
        self.registered.read().len()
    }

    pub fn active_names(&self) -> Vec<String> {
        self.active
            .read()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }
}

impl fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureSet")
            .field("registered", &self.registered_len())
            .field("active", &self.active_names())
            .finish()
    }
}
