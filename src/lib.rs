//! Workspace façade crate.
//!
//! Re-exports the orchestrator and the local bridge adapters behind the
//! `local-store` feature so an embedding host can depend on `hookbridge`
//! alone instead of wiring each workspace crate.

#[cfg(feature = "local-store")]
pub use bridge_local::{FsFileStore, MemoryFileStore};

#[cfg(feature = "local-store")]
pub use core_service::{
    Bootstrap, BootstrapState, BridgeFactory, CoreDependencies, CoreError, ErrorKind, Feature,
    FeatureContext, Result, SetupRequirements, SetupWizard, WizardStep,
};

#[cfg(feature = "local-store")]
pub use core_service as service;
