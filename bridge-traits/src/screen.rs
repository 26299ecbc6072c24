//! Setup Screen Contract
//!
//! Screens are thin presentation owned by the host UI. The setup wizard
//! drives them through this contract and owns the "next" gate each screen
//! toggles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared gate a screen flips to allow moving past it.
#[derive(Debug, Clone, Default)]
pub struct NextGate(Arc<AtomicBool>);

impl NextGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, allowed: bool) {
        self.0.store(allowed, Ordering::SeqCst);
    }

    pub fn is_allowed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One wizard screen.
pub trait Screen: Send {
    /// Navigation route of the screen
    fn route(&self) -> &str;

    /// Called once before the wizard shows anything
    fn init(&mut self, gate: NextGate);

    /// Called when the user moves past the screen
    fn on_leave(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_shared_between_clones() {
        let gate = NextGate::new();
        let screen_side = gate.clone();
        assert!(!gate.is_allowed());
        screen_side.allow(true);
        assert!(gate.is_allowed());
    }
}
