//! Bootstrap state machine.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator is in the attach sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    /// Nothing attached yet
    Unattached,
    /// Waiting for the companion handshake
    BridgeConnecting,
    /// Handshake or init sequence failed; a soft restart was requested
    BridgeFailed,
    /// Companion package is not installed
    Fatal,
    /// Bridge is up but mappings are stale or absent; features stay inert
    MappingsMissing,
    /// Features initialized
    Ready,
}

impl BootstrapState {
    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BootstrapState::BridgeFailed
                | BootstrapState::Fatal
                | BootstrapState::MappingsMissing
                | BootstrapState::Ready
        )
    }

    /// Whether the init sequence completed (with or without mappings).
    pub fn is_initialized(&self) -> bool {
        matches!(self, BootstrapState::MappingsMissing | BootstrapState::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapState::Unattached => "unattached",
            BootstrapState::BridgeConnecting => "bridge_connecting",
            BootstrapState::BridgeFailed => "bridge_failed",
            BootstrapState::Fatal => "fatal",
            BootstrapState::MappingsMissing => "mappings_missing",
            BootstrapState::Ready => "ready",
        }
    }

    /// Checks that moving to `to` is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidStateTransition`] for any move outside
    /// `Unattached -> BridgeConnecting | Fatal` and
    /// `BridgeConnecting -> BridgeFailed | MappingsMissing | Ready`.
    pub fn validate_transition(&self, to: BootstrapState) -> Result<()> {
        let valid = match (self, to) {
            // From Unattached
            (BootstrapState::Unattached, BootstrapState::BridgeConnecting) => true,
            (BootstrapState::Unattached, BootstrapState::Fatal) => true,

            // From BridgeConnecting
            (BootstrapState::BridgeConnecting, BootstrapState::BridgeFailed) => true,
            (BootstrapState::BridgeConnecting, BootstrapState::MappingsMissing) => true,
            (BootstrapState::BridgeConnecting, BootstrapState::Ready) => true,

            // Terminal states cannot transition
            (from, _) if from.is_terminal() => false,

            _ => false,
        };

        if !valid {
            return Err(CoreError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!("Cannot transition from {} to {}", self, to),
            });
        }

        Ok(())
    }
}

impl Default for BootstrapState {
    fn default() -> Self {
        BootstrapState::Unattached
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BootstrapState; 6] = [
        BootstrapState::Unattached,
        BootstrapState::BridgeConnecting,
        BootstrapState::BridgeFailed,
        BootstrapState::Fatal,
        BootstrapState::MappingsMissing,
        BootstrapState::Ready,
    ];

    #[test]
    fn test_allowed_transitions() {
        use BootstrapState::*;
        assert!(Unattached.validate_transition(BridgeConnecting).is_ok());
        assert!(Unattached.validate_transition(Fatal).is_ok());
        assert!(BridgeConnecting.validate_transition(BridgeFailed).is_ok());
        assert!(BridgeConnecting.validate_transition(MappingsMissing).is_ok());
        assert!(BridgeConnecting.validate_transition(Ready).is_ok());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                let err = from.validate_transition(to).unwrap_err();
                assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
            }
        }
    }

    #[test]
    fn test_skipping_the_handshake_is_rejected() {
        let err = BootstrapState::Unattached
            .validate_transition(BootstrapState::Ready)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from unattached to ready: Cannot transition from unattached to ready"
        );
    }

    #[test]
    fn test_initialized_states() {
        let initialized: Vec<_> = ALL.iter().filter(|s| s.is_initialized()).collect();
        assert_eq!(
            initialized,
            vec![&BootstrapState::MappingsMissing, &BootstrapState::Ready]
        );
    }
}
