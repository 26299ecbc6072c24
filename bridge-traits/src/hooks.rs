//! Method Interception Registry
//!
//! The interception engine itself is external. The core only needs to say
//! "run this handler before/after that host method, but only while this gate
//! holds".

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::Result,
    host::{ForegroundEntry, HostContext},
};

/// When a handler runs relative to the intercepted method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    Before,
    After,
}

/// Fully qualified host method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub class: String,
    pub method: String,
}

impl MethodSignature {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }

    /// `Application.attach`, the process entry point.
    pub fn application_attach() -> Self {
        Self::new("android.app.Application", "attach")
    }

    pub fn activity_create() -> Self {
        Self::new("android.app.Activity", "onCreate")
    }

    pub fn activity_pause() -> Self {
        Self::new("android.app.Activity", "onPause")
    }

    pub fn activity_resume() -> Self {
        Self::new("android.app.Activity", "onResume")
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.method)
    }
}

/// Receiver of an intercepted call.
#[derive(Clone)]
pub enum HookTarget {
    /// Process-level call carrying the host context
    Process(Arc<dyn HostContext>),
    /// Call on a foreground entry point
    Entry(Arc<dyn ForegroundEntry>),
    /// Any other receiver the core does not inspect
    Other,
}

/// An intercepted call as seen by a handler.
#[derive(Clone)]
pub struct HookCall {
    pub method: MethodSignature,
    pub stage: HookStage,
    pub target: HookTarget,
}

impl fmt::Debug for HookCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target {
            HookTarget::Process(_) => "Process",
            HookTarget::Entry(_) => "Entry",
            HookTarget::Other => "Other",
        };
        f.debug_struct("HookCall")
            .field("method", &self.method)
            .field("stage", &self.stage)
            .field("target", &target)
            .finish()
    }
}

/// Predicate consulted before a handler runs.
pub type HookGate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Handler invoked for an intercepted call.
pub type HookHandler = Arc<dyn Fn(&HookCall) + Send + Sync>;

/// Identifier of a registered interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub Uuid);

impl HookHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HookHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration contract of the interception engine.
pub trait HookRegistry: Send + Sync {
    /// Registers `handler` for `method` at `stage`. When a gate is given the
    /// engine must skip the handler while the gate returns `false`.
    fn register(
        &self,
        method: MethodSignature,
        stage: HookStage,
        gate: Option<HookGate>,
        handler: HookHandler,
    ) -> Result<HookHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(
            MethodSignature::activity_resume().to_string(),
            "android.app.Activity#onResume"
        );
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(HookHandle::new(), HookHandle::new());
    }

    #[test]
    fn test_hook_call_debug_names_target() {
        let call = HookCall {
            method: MethodSignature::activity_pause(),
            stage: HookStage::After,
            target: HookTarget::Other,
        };
        assert!(format!("{:?}", call).contains("Other"));
    }
}
