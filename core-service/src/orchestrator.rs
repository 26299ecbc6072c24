//! # Bootstrap Orchestrator
//!
//! Sequences the companion handshake, the mapping load, feature gating and
//! directory sync for one host process.
//!
//! ## Threads
//!
//! [`Bootstrap::attach`] runs on the host thread that attaches the process
//! and returns as soon as the connection has been started. The connect
//! callback runs on a thread owned by the bridge client and performs the
//! only blocking wait in the crate: the init sequence is driven to
//! completion with [`runtime::block_on`] so that the state transition that
//! follows it sees a definite outcome.
//!
//! Lifecycle continuations never block. Anything beyond a flag update is
//! spawned on the background runtime from [`CoreDependencies`].

use crate::actions::ActionManager;
use crate::error::{CoreError, Result};
use crate::features::{Feature, FeatureContext, FeatureSet};
use crate::native::{install_unary_interceptor, native_hooks_enabled};
use crate::scope::ProcessScope;
use crate::setup::SetupRequirements;
use crate::state::BootstrapState;
use crate::CoreDependencies;
use bridge_traits::bridge::BridgeClient;
use bridge_traits::hooks::{
    HookCall, HookGate, HookHandle, HookHandler, HookRegistry, HookStage, HookTarget,
    MethodSignature,
};
use bridge_traits::host::{ForegroundEntry, HostContext};
use core_async::runtime;
use core_async::task::JoinHandle;
use core_async::time::{self, measure_sync, Instant};
use core_mappings::MappingCache;
use core_runtime::config::ConfigHandle;
use core_runtime::events::{EventBus, ForegroundCreatedEvent};
use core_runtime::translation::Translations;
use core_sync::DirectorySync;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, instrument, warn};

/// Per-process orchestrator.
pub struct Bootstrap {
    deps: CoreDependencies,
    scope: ProcessScope,
    state: Mutex<BootstrapState>,
    initialized: AtomicBool,
    connect_settled: AtomicBool,
    resumes: AtomicU32,
    bridge: OnceLock<Arc<dyn BridgeClient>>,
    config: Arc<ConfigHandle>,
    translations: Arc<Translations>,
    events: EventBus,
    features: FeatureSet,
    actions: Arc<ActionManager>,
    mappings: OnceLock<Arc<MappingCache>>,
    feature_context: OnceLock<FeatureContext>,
    directory: OnceLock<Arc<DirectorySync>>,
    foreground: Mutex<Option<Arc<dyn ForegroundEntry>>>,
}

impl Bootstrap {
    pub fn new(deps: CoreDependencies) -> Arc<Self> {
        let config = ConfigHandle::new(deps.config.clone());
        let translations = Translations::new(deps.config.locale.clone());
        Arc::new(Self {
            deps,
            scope: ProcessScope::new(),
            state: Mutex::new(BootstrapState::Unattached),
            initialized: AtomicBool::new(false),
            connect_settled: AtomicBool::new(false),
            resumes: AtomicU32::new(0),
            bridge: OnceLock::new(),
            config: Arc::new(config),
            translations: Arc::new(translations),
            events: EventBus::new(),
            features: FeatureSet::new(),
            actions: Arc::new(ActionManager::new()),
            mappings: OnceLock::new(),
            feature_context: OnceLock::new(),
            directory: OnceLock::new(),
            foreground: Mutex::new(None),
        })
    }

    /// Adds a feature. Features registered after the init sequence are
    /// never initialized.
    pub fn register_feature(&self, feature: Arc<dyn Feature>) {
        self.features.register(feature);
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.lock()
    }

    /// Gate predicate of every lifecycle hook.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn scope(&self) -> &ProcessScope {
        &self.scope
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> Arc<ConfigHandle> {
        Arc::clone(&self.config)
    }

    pub fn translations(&self) -> Arc<Translations> {
        Arc::clone(&self.translations)
    }

    pub fn actions(&self) -> Arc<ActionManager> {
        Arc::clone(&self.actions)
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn bridge(&self) -> Result<Arc<dyn BridgeClient>> {
        self.bridge
            .get()
            .cloned()
            .ok_or(CoreError::NotInitialized("bridge client"))
    }

    pub fn mappings(&self) -> Result<Arc<MappingCache>> {
        self.mappings
            .get()
            .cloned()
            .ok_or(CoreError::NotInitialized("mapping cache"))
    }

    /// Setup steps the user still has to go through.
    pub fn setup_requirements(&self) -> SetupRequirements {
        match self.mappings.get() {
            Some(mappings) if !mappings.is_stale() => SetupRequirements::NONE,
            _ => SetupRequirements::MAPPINGS,
        }
    }

    fn transition(&self, to: BootstrapState) -> Result<()> {
        let mut state = self.state.lock();
        state.validate_transition(to)?;
        info!(from = %*state, to = %to, "Bootstrap state changed");
        *state = to;
        Ok(())
    }

    /// Attaches to the host process and starts the companion handshake.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyInitialized`] on a second attach
    /// - [`CoreError::Fatal`] when the companion package is missing; the
    ///   failure has already been reported through the host
    #[instrument(skip_all, fields(host = %host.package_name()))]
    pub fn attach(self: &Arc<Self>, host: Arc<dyn HostContext>) -> Result<()> {
        self.state()
            .validate_transition(BootstrapState::BridgeConnecting)?;
        self.scope.init(Arc::clone(&host))?;

        let bridge = self.deps.bridge_factory.create(Arc::clone(&host))?;
        let bridge = Arc::clone(self.bridge.get_or_init(|| bridge));

        if let Err(e) = self.probe_companion(host.as_ref()) {
            error!(error = %e, "Companion service unavailable");
            host.report_fatal(&e.to_string());
            self.transition(BootstrapState::Fatal)?;
            return Err(e);
        }

        self.transition(BootstrapState::BridgeConnecting)?;
        self.start_watchdog();

        let this = Arc::clone(self);
        bridge.connect(Box::new(move |connected| {
            this.on_bridge_connected(connected);
        }));
        Ok(())
    }

    fn probe_companion(&self, host: &dyn HostContext) -> Result<()> {
        let package = &self.deps.companion_package;
        match host.package_info(package) {
            Ok(Some(info)) => {
                debug!(package = %package, version = info.version_code, "Companion found");
                Ok(())
            }
            Ok(None) => Err(CoreError::Fatal(format!(
                "Companion package {} is not installed",
                package
            ))),
            Err(e) => Err(CoreError::Fatal(format!(
                "Companion package {} cannot be queried: {}",
                package, e
            ))),
        }
    }

    fn start_watchdog(self: &Arc<Self>) {
        let Some(limit) = self.config.current().connect_timeout() else {
            return;
        };

        let weak = Arc::downgrade(self);
        self.deps.runtime.spawn(async move {
            time::sleep(limit).await;
            let Some(this) = weak.upgrade() else {
                return;
            };
            if !this.connect_settled.swap(true, Ordering::SeqCst) {
                this.fail_and_restart(&CoreError::BridgeConnectFailed(format!(
                    "no handshake result after {}ms",
                    limit.as_millis()
                )));
            }
        });
    }

    fn fail_and_restart(&self, err: &CoreError) {
        error!(error = %err, kind = ?err.kind(), "Bootstrap failed, requesting soft restart");
        if let Err(e) = self.transition(BootstrapState::BridgeFailed) {
            warn!(error = %e, "Bootstrap state not updated");
        }
        if let Ok(host) = self.scope.host() {
            host.soft_restart();
        }
    }

    /// Completion of the companion handshake.
    ///
    /// Only the first result counts: a result arriving after the watchdog
    /// fired, or a second callback, is ignored. Returns the resulting state.
    pub fn on_bridge_connected(&self, connected: bool) -> BootstrapState {
        if self.connect_settled.swap(true, Ordering::SeqCst) {
            warn!(connected, "Ignoring late handshake result");
            return self.state();
        }

        if !connected {
            self.fail_and_restart(&CoreError::BridgeConnectFailed(
                "companion refused the connection".to_string(),
            ));
            return self.state();
        }

        let outcome = runtime::block_on(self.init_with_deadline())
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))
            .and_then(|result| result);

        match outcome {
            Ok(state) => match self.transition(state) {
                Ok(()) => self.initialized.store(true, Ordering::SeqCst),
                Err(e) => warn!(error = %e, "Init sequence finished in an unexpected state"),
            },
            Err(e) => self.fail_and_restart(&e),
        }
        self.state()
    }

    async fn init_with_deadline(&self) -> Result<BootstrapState> {
        match self.config.current().connect_timeout() {
            Some(limit) => time::timeout(limit, self.run_init_sequence())
                .await
                .map_err(|_| {
                    CoreError::InitializationFailed(format!(
                        "init sequence exceeded {}ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.run_init_sequence().await,
        }
    }

    #[instrument(skip_all)]
    async fn run_init_sequence(&self) -> Result<BootstrapState> {
        let started = Instant::now();
        let bridge = self.bridge()?;
        let host = self.scope.host()?;

        let config = self.config.reload_from_bridge(bridge.as_ref()).await?;

        if native_hooks_enabled(self.deps.session.as_ref(), &config) {
            match &self.deps.native {
                Some(native) => install_unary_interceptor(
                    native.as_ref(),
                    self.scope.class_loader()?,
                    self.events.clone(),
                )?,
                None => warn!("Native hooks enabled without a native bridge"),
            }
        } else {
            debug!("Native interception skipped");
        }

        self.translations.set_locale(config.locale.clone());
        let translations = Arc::clone(&self.translations);
        let source = Arc::clone(&bridge);
        let loaded = self
            .deps
            .runtime
            .spawn(async move { translations.load_from_bridge(source.as_ref()).await })
            .await;
        match loaded {
            Ok(Ok(count)) => debug!(count, locale = %config.locale, "Translations loaded"),
            Ok(Err(e)) => warn!(error = %e, locale = %config.locale, "Translations unavailable"),
            Err(e) => warn!(error = %e, "Translation task failed"),
        }

        let mappings = Arc::clone(self.mappings.get_or_init(|| {
            Arc::new(MappingCache::new(
                Arc::clone(&host),
                bridge.files(),
                Arc::clone(&self.deps.scanner),
            ))
        }));
        if let Err(e) = mappings.init().await {
            warn!(error = %e, "Mapping cache not loaded");
        }

        if mappings.is_stale() {
            info!(
                entries = mappings.len(),
                host_version = mappings.host_version(),
                build_number = ?mappings.build_number(),
                "Mappings missing or outdated, features stay inactive"
            );
            return Ok(BootstrapState::MappingsMissing);
        }

        let classes = self.scope.classes()?;
        let ctx = self.feature_context.get_or_init(|| FeatureContext {
            mappings: Arc::clone(&mappings),
            events: self.events.clone(),
            config: Arc::clone(&self.config),
            translations: Arc::clone(&self.translations),
            classes,
            actions: Arc::clone(&self.actions),
        });
        let active = self.features.init_all(ctx);

        let directory = self.directory.get_or_init(|| {
            DirectorySync::new(
                Arc::clone(&bridge),
                Arc::clone(&self.deps.session),
                self.events.clone(),
                self.deps.runtime.clone(),
            )
        });
        drop(directory.register());

        self.connect_scripts(bridge.as_ref()).await;

        info!(
            features = active,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Init sequence took"
        );
        Ok(BootstrapState::Ready)
    }

    async fn connect_scripts(&self, bridge: &dyn BridgeClient) {
        let result = match bridge.scripting_interface() {
            Ok(interface) => self.deps.scripts.connect(interface).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!("Scripting runtime connected"),
            Err(e) => warn!(error = %e, "Scripting runtime not connected"),
        }
    }

    fn is_host_entry(&self, entry: &dyn ForegroundEntry) -> bool {
        self.scope
            .host()
            .map(|host| host.package_name() == entry.package_name())
            .unwrap_or(false)
    }

    /// A host foreground entry was created.
    ///
    /// The entry becomes the owned foreground reference. Features are
    /// activated only for the first entry of the process and only when the
    /// mappings are usable. Returns whether activation ran.
    pub fn on_create(&self, entry: Arc<dyn ForegroundEntry>) -> bool {
        if !self.is_initialized() || !self.is_host_entry(entry.as_ref()) {
            return false;
        }

        let previous = self.foreground.lock().replace(Arc::clone(&entry));
        let mappings_loaded = self.mappings.get().is_some_and(|m| m.is_loaded());
        if previous.is_some() || !mappings_loaded {
            debug!(entry = entry.id(), "Foreground entry replaced without activation");
            return false;
        }
        let Some(ctx) = self.feature_context.get() else {
            return false;
        };

        let ((), elapsed) = measure_sync(|| {
            self.features.on_foreground_ready(ctx, entry.as_ref());
            ctx.actions.init();
            if self.deps.scripts.is_connected() {
                self.deps.scripts.notify_foreground(entry.as_ref());
            }
            self.events.post(ForegroundCreatedEvent::new(entry.id()));
        });
        info!(
            entry = entry.id(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Foreground activation took"
        );
        true
    }

    /// A host foreground entry was paused. Closes any companion overlay.
    pub fn on_pause(&self, entry: Arc<dyn ForegroundEntry>) -> Option<JoinHandle<()>> {
        if !self.is_initialized() || !self.is_host_entry(entry.as_ref()) {
            return None;
        }
        let bridge = self.bridge.get().cloned()?;
        Some(self.deps.runtime.spawn(async move {
            if let Err(e) = bridge.close_overlay().await {
                debug!(error = %e, "Overlay close failed");
            }
        }))
    }

    /// A host foreground entry was resumed.
    ///
    /// The first `bootstrap.resume_skip_count` resumes are ignored. Later
    /// ones route the entry's intent to the action manager, reload the
    /// configuration and re-register directory sync.
    pub fn on_resume(&self, entry: Arc<dyn ForegroundEntry>) -> Option<JoinHandle<()>> {
        if !self.is_initialized() || !self.is_host_entry(entry.as_ref()) {
            return None;
        }

        let seen = self.resumes.fetch_add(1, Ordering::SeqCst);
        let skip = self.config.current().bootstrap.resume_skip_count;
        if seen < skip {
            debug!(resume = seen + 1, skip, "Ignoring resume");
            return None;
        }

        let bridge = self.bridge.get().cloned()?;
        let config = Arc::clone(&self.config);
        let actions = Arc::clone(&self.actions);
        let directory = self.directory.get().cloned();
        let intent = entry.intent();

        Some(self.deps.runtime.spawn(async move {
            if let Some(intent) = intent {
                actions.on_new_intent(intent);
            }
            if let Err(e) = config.reload_from_bridge(bridge.as_ref()).await {
                warn!(error = %e, "Configuration reload failed");
            }
            if let Some(directory) = directory {
                if let Err(e) = directory.register().await {
                    warn!(error = %e, "Directory sync registration task failed");
                }
            }
        }))
    }

    /// Registers the attach hook and the gated lifecycle hooks.
    pub fn install_hooks(self: &Arc<Self>, registry: &dyn HookRegistry) -> Result<Vec<HookHandle>> {
        let mut handles = Vec::with_capacity(4);

        let weak = Arc::downgrade(self);
        let attach: HookHandler = Arc::new(move |call: &HookCall| {
            let (Some(this), HookTarget::Process(host)) = (weak.upgrade(), &call.target) else {
                return;
            };
            if let Err(e) = this.attach(Arc::clone(host)) {
                error!(error = %e, kind = ?e.kind(), "Attach failed");
            }
        });
        handles.push(registry.register(
            MethodSignature::application_attach(),
            HookStage::Before,
            None,
            attach,
        )?);

        let lifecycle: [(MethodSignature, fn(&Bootstrap, Arc<dyn ForegroundEntry>)); 3] = [
            (MethodSignature::activity_create(), |b, entry| {
                b.on_create(entry);
            }),
            (MethodSignature::activity_pause(), |b, entry| {
                b.on_pause(entry);
            }),
            (MethodSignature::activity_resume(), |b, entry| {
                b.on_resume(entry);
            }),
        ];

        for (method, continuation) in lifecycle {
            let gate_ref = Arc::downgrade(self);
            let gate: HookGate =
                Arc::new(move || gate_ref.upgrade().is_some_and(|b| b.is_initialized()));

            let weak = Arc::downgrade(self);
            let handler: HookHandler = Arc::new(move |call: &HookCall| {
                let (Some(this), HookTarget::Entry(entry)) = (weak.upgrade(), &call.target) else {
                    return;
                };
                continuation(&*this, Arc::clone(entry));
            });

            handles.push(registry.register(method, HookStage::After, Some(gate), handler)?);
        }

        debug!(hooks = handles.len(), "Lifecycle hooks installed");
        Ok(handles)
    }
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("state", &self.state())
            .field("initialized", &self.is_initialized())
            .field("scope", &self.scope)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}
