use bridge_traits::BridgeError;
use core_mappings::{CacheError, LookupError};
use core_sync::SyncError;
use thiserror::Error;

/// How a failure is handled by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Reported to the user; feature loading halts
    Fatal,
    /// Handled with a soft restart of the host process
    RecoverableRestart,
    /// Process keeps running with no feature activated
    RecoverableSkip,
    /// Returned to the immediate caller
    Local,
    /// Logged and swallowed
    Cosmetic,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("Bridge connection failed: {0}")]
    BridgeConnectFailed(String),

    #[error("Mappings unavailable: {0}")]
    MappingsUnavailable(String),

    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("{0} accessed before attach")]
    NotInitialized(&'static str),

    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Mapping cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Fatal(_) => ErrorKind::Fatal,
            CoreError::BridgeConnectFailed(_)
            | CoreError::InitializationFailed(_)
            | CoreError::Runtime(_)
            | CoreError::Bridge(_) => ErrorKind::RecoverableRestart,
            CoreError::MappingsUnavailable(_) | CoreError::Cache(_) => ErrorKind::RecoverableSkip,
            CoreError::Lookup(_)
            | CoreError::NotInitialized(_)
            | CoreError::AlreadyInitialized(_)
            | CoreError::InvalidStateTransition { .. } => ErrorKind::Local,
            CoreError::Sync(_) => ErrorKind::Cosmetic,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CoreError::Fatal("x".into()).kind(), ErrorKind::Fatal);
        assert_eq!(
            CoreError::from(BridgeError::Disconnected).kind(),
            ErrorKind::RecoverableRestart
        );
        assert_eq!(
            CoreError::from(CacheError::Missing).kind(),
            ErrorKind::RecoverableSkip
        );
        assert_eq!(
            CoreError::from(LookupError::MissingKey("k".into())).kind(),
            ErrorKind::Local
        );
        assert_eq!(
            CoreError::from(SyncError::MalformedRow("r".into())).kind(),
            ErrorKind::Cosmetic
        );
    }

    #[test]
    fn test_not_initialized_message() {
        assert_eq!(
            CoreError::NotInitialized("process scope").to_string(),
            "process scope accessed before attach"
        );
    }
}
