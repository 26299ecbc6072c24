use crate::entry::MappingKind;
use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures while loading, refreshing or persisting the mapping cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Mapping cache is corrupt: {0}")]
    CorruptCache(String),

    #[error("Symbol scan failed: {0}")]
    ScanFailed(String),

    #[error("No persisted mapping cache")]
    Missing,

    #[error("Mapping cache persistence failed: {0}")]
    Persistence(#[from] BridgeError),
}

/// Failures reading a single entry.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Mapping not found: {0}")]
    MissingKey(String),

    #[error("Mapping {key} is not a {expected}")]
    TypeMismatch { key: String, expected: MappingKind },

    #[error("Mapped class {class} could not be loaded: {source}")]
    ClassNotFound {
        class: String,
        #[source]
        source: BridgeError,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;
