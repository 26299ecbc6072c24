//! In-memory bridge file storage

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    storage::{BridgeFileType, FileStore},
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Bridge files kept in process memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<BridgeFileType, Bytes>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `file`.
    pub fn with_file(file: BridgeFileType, data: impl Into<Bytes>) -> Self {
        let store = Self::new();
        store.files.write().insert(file, data.into());
        store
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn exists(&self, file: BridgeFileType) -> Result<bool> {
        Ok(self.files.read().contains_key(&file))
    }

    async fn read(&self, file: BridgeFileType) -> Result<Option<Bytes>> {
        Ok(self.files.read().get(&file).cloned())
    }

    async fn write(&self, file: BridgeFileType, data: Bytes) -> Result<()> {
        self.files.write().insert(file, data);
        Ok(())
    }

    async fn delete(&self, file: BridgeFileType) -> Result<()> {
        self.files.write().remove(&file);
        Ok(())
    }
}
