//! Bridge File Storage
//!
//! The companion service owns persistent files on behalf of the host process,
//! which usually cannot write outside its own sandbox. Files are addressed by
//! [`BridgeFileType`] rather than by path.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::error::Result;

/// Files the companion stores for the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeFileType {
    /// Companion-managed configuration document
    Config,
    /// Persisted symbol mapping document
    Mappings,
    /// Cached translation table
    Translations,
}

impl BridgeFileType {
    /// File name used by stores that keep one file per type.
    pub fn file_name(&self) -> &'static str {
        match self {
            BridgeFileType::Config => "config.json",
            BridgeFileType::Mappings => "mappings.json",
            BridgeFileType::Translations => "translations.json",
        }
    }
}

impl fmt::Display for BridgeFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Access to bridge-backed files.
///
/// `read` returns `Ok(None)` for a missing file so callers can distinguish
/// "never written" from a transport failure.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Check whether the file exists
    async fn exists(&self, file: BridgeFileType) -> Result<bool>;

    /// Read the whole file
    async fn read(&self, file: BridgeFileType) -> Result<Option<Bytes>>;

    /// Replace the file contents
    async fn write(&self, file: BridgeFileType, data: Bytes) -> Result<()>;

    /// Delete the file; deleting a missing file is not an error
    async fn delete(&self, file: BridgeFileType) -> Result<()>;
}
