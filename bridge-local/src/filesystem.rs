//! Bridge file storage on a local directory using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{BridgeFileType, FileStore},
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Stores each bridge file as `<root>/<file_name>`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written mapping document.
#[derive(Debug, Clone)]
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `file` under the store root.
    pub fn path_of(&self, file: BridgeFileType) -> PathBuf {
        self.root.join(file.file_name())
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn exists(&self, file: BridgeFileType) -> Result<bool> {
        fs::try_exists(self.path_of(file))
            .await
            .map_err(Self::map_io_error)
    }

    async fn read(&self, file: BridgeFileType) -> Result<Option<Bytes>> {
        match fs::read(self.path_of(file)).await {
            Ok(data) => {
                debug!(file = %file, size = data.len(), "Read bridge file");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn write(&self, file: BridgeFileType, data: Bytes) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(Self::map_io_error)?;

        let target = self.path_of(file);
        let staging = self
            .root
            .join(format!(".{}.{}.tmp", file.file_name(), Uuid::new_v4()));

        let mut handle = fs::File::create(&staging)
            .await
            .map_err(Self::map_io_error)?;
        handle.write_all(&data).await.map_err(Self::map_io_error)?;
        handle.sync_all().await.map_err(Self::map_io_error)?;
        drop(handle);

        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(Self::map_io_error(e));
        }

        debug!(file = %file, size = data.len(), "Wrote bridge file");
        Ok(())
    }

    async fn delete(&self, file: BridgeFileType) -> Result<()> {
        match fs::remove_file(self.path_of(file)).await {
            Ok(()) => {
                debug!(file = %file, "Deleted bridge file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }
}
