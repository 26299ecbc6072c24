use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Malformed session row: {0}")]
    MalformedRow(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
