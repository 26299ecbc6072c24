//! # Mapping Cache
//!
//! Symbol mappings for the installed host build, persisted through the
//! companion so the expensive scan runs once per host update.
//!
//! ## Lifecycle
//!
//! ```text
//!   new() ── init() ──┬── load() ok ────────────> loaded (maybe stale)
//!                     ├── Missing ──────────────> empty
//!                     └── CorruptCache ─ delete ─> empty
//!
//!   refresh(path) ── scan (blocking thread) ── stamp version ── write ── swap
//! ```
//!
//! The in-memory state is an immutable snapshot behind a lock and is only
//! ever replaced whole: readers see either the old entries or the new ones,
//! never a mix, and a failed load leaves the cache empty.

use crate::document::MappingDocument;
use crate::entry::{MappingEntry, MappingKind};
use crate::error::{CacheError, LookupError, Result};
use bridge_traits::host::{ClassLoader, HostClass, HostContext};
use bridge_traits::scanner::SymbolScanner;
use bridge_traits::storage::{BridgeFileType, FileStore};
use bytes::Bytes;
use core_async::task;
use core_runtime::logging::strip_path;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Version reported when the host package cannot be queried.
pub const UNKNOWN_VERSION: i64 = -1;

#[derive(Debug, Default)]
struct Snapshot {
    entries: HashMap<String, MappingEntry>,
    build_number: Option<i64>,
}

impl From<MappingDocument> for Snapshot {
    fn from(doc: MappingDocument) -> Self {
        Self {
            entries: doc.entries,
            build_number: Some(doc.build_number),
        }
    }
}

/// Versioned cache of host symbol mappings.
pub struct MappingCache {
    host: Arc<dyn HostContext>,
    files: Arc<dyn FileStore>,
    scanner: Arc<dyn SymbolScanner>,
    host_version: AtomicI64,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl MappingCache {
    /// Creates an empty cache and captures the installed host version.
    pub fn new(
        host: Arc<dyn HostContext>,
        files: Arc<dyn FileStore>,
        scanner: Arc<dyn SymbolScanner>,
    ) -> Self {
        let cache = Self {
            host,
            files,
            scanner,
            host_version: AtomicI64::new(UNKNOWN_VERSION),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        };
        cache.capture_host_version();
        cache
    }

    fn capture_host_version(&self) -> i64 {
        let version = self
            .host
            .installed_package()
            .map_or(UNKNOWN_VERSION, |info| info.version_code);
        self.host_version.store(version, Ordering::SeqCst);
        version
    }

    /// Host build number seen by the last package query.
    pub fn host_version(&self) -> i64 {
        self.host_version.load(Ordering::SeqCst)
    }

    /// Attach-time load.
    ///
    /// Re-reads the host version and loads the persisted document. A corrupt
    /// document is deleted so the next refresh starts clean. Returns whether
    /// entries are loaded; staleness is left to the caller.
    pub async fn init(&self) -> Result<bool> {
        let version = self.capture_host_version();

        match self.load().await {
            Ok(()) => {}
            Err(CacheError::Missing) => {
                debug!(host_version = version, "No persisted mappings");
            }
            Err(CacheError::CorruptCache(reason)) => {
                warn!(reason = %reason, "Discarding corrupt mapping cache");
                if let Err(e) = self.files.delete(BridgeFileType::Mappings).await {
                    warn!(error = %e, "Failed to delete corrupt mapping cache");
                }
            }
            Err(e) => return Err(e),
        }

        Ok(self.is_loaded())
    }

    /// Loads the persisted document, replacing the current snapshot.
    ///
    /// On any failure the cache is left empty.
    pub async fn load(&self) -> Result<()> {
        let result = self.read_document().await;
        match result {
            Ok(doc) => {
                info!(
                    build_number = doc.build_number,
                    entries = doc.entries.len(),
                    "Mappings loaded"
                );
                self.swap(doc.into());
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    async fn read_document(&self) -> Result<MappingDocument> {
        let bytes = self
            .files
            .read(BridgeFileType::Mappings)
            .await?
            .ok_or(CacheError::Missing)?;
        MappingDocument::parse(&bytes)
    }

    /// Scans `binary`, persists the result and swaps it in.
    ///
    /// The document is stamped with the host version installed when the
    /// scan completes. The previous snapshot stays in place if scanning or
    /// persisting fails.
    #[instrument(skip_all, fields(binary = %strip_path(&binary.to_string_lossy())))]
    pub async fn refresh(&self, binary: &Path) -> Result<()> {
        let scanner = Arc::clone(&self.scanner);
        let path: PathBuf = binary.to_path_buf();

        let scan = task::spawn_blocking(move || {
            std::fs::metadata(&path)
                .map_err(|e| format!("cannot read host binary {}: {}", path.display(), e))?;
            scanner.scan(&path).map_err(|e| format!("{:#}", e))
        })
        .await
        .map_err(|e| CacheError::ScanFailed(format!("scanner task aborted: {}", e)))?
        .map_err(CacheError::ScanFailed)?;

        let version = self.capture_host_version();
        let doc = MappingDocument::from_scan(scan, version)?;
        self.files
            .write(BridgeFileType::Mappings, Bytes::from(doc.to_bytes()?))
            .await?;

        info!(
            build_number = doc.build_number,
            entries = doc.entries.len(),
            "Mappings refreshed"
        );
        self.swap(doc.into());
        Ok(())
    }

    /// Refreshes from the installed host package binary.
    pub async fn refresh_installed(&self) -> Result<()> {
        let package = self
            .host
            .installed_package()
            .ok_or_else(|| CacheError::ScanFailed("host package not found".to_string()))?;
        let path = package
            .source_dir
            .ok_or_else(|| CacheError::ScanFailed("host package path unavailable".to_string()))?;
        self.refresh(&path).await
    }

    fn swap(&self, snapshot: Snapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.swap(Snapshot::default());
    }

    pub fn is_loaded(&self) -> bool {
        !self.current().entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_loaded()
    }

    /// Build number recorded in the loaded document.
    pub fn build_number(&self) -> Option<i64> {
        self.current().build_number
    }

    /// True when nothing is loaded or the entries were scanned from another
    /// host build than the one installed right now.
    pub fn is_stale(&self) -> bool {
        let snapshot = self.current();
        snapshot.entries.is_empty() || snapshot.build_number != Some(self.capture_host_version())
    }

    pub fn get(&self, key: &str) -> std::result::Result<MappingEntry, LookupError> {
        self.get_optional(key)
            .ok_or_else(|| LookupError::MissingKey(key.to_string()))
    }

    pub fn get_optional(&self, key: &str) -> Option<MappingEntry> {
        self.current().entries.get(key).cloned()
    }

    pub fn get_string(&self, key: &str) -> std::result::Result<String, LookupError> {
        match self.get(key)? {
            MappingEntry::Scalar(s) => Ok(s),
            _ => Err(mismatch(key, MappingKind::Scalar)),
        }
    }

    /// Reads a list entry, deserializing every element as `T`.
    pub fn get_list<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> std::result::Result<Vec<T>, LookupError> {
        let MappingEntry::List(items) = self.get(key)? else {
            return Err(mismatch(key, MappingKind::List));
        };
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|_| mismatch(key, MappingKind::List)))
            .collect()
    }

    pub fn get_map(&self, key: &str) -> std::result::Result<BTreeMap<String, Value>, LookupError> {
        match self.get(key)? {
            MappingEntry::Map(map) => Ok(map),
            _ => Err(mismatch(key, MappingKind::Map)),
        }
    }

    /// Reads `sub_key` of a map entry as a string.
    ///
    /// A missing second level is reported as `MissingKey("key.sub_key")`.
    pub fn get_nested_string(
        &self,
        key: &str,
        sub_key: &str,
    ) -> std::result::Result<String, LookupError> {
        let path = format!("{}.{}", key, sub_key);
        match self.get_map(key)?.remove(sub_key) {
            Some(Value::String(s)) => Ok(s),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Null) | None => Err(LookupError::MissingKey(path)),
            Some(_) => Err(LookupError::TypeMismatch {
                key: path,
                expected: MappingKind::Scalar,
            }),
        }
    }

    /// Loads the class named by a scalar entry.
    pub fn resolve_class(
        &self,
        key: &str,
        loader: &dyn ClassLoader,
    ) -> std::result::Result<HostClass, LookupError> {
        load_class(loader, self.get_string(key)?)
    }

    /// Loads the class named by `sub_key` of a map entry.
    pub fn resolve_nested_class(
        &self,
        key: &str,
        sub_key: &str,
        loader: &dyn ClassLoader,
    ) -> std::result::Result<HostClass, LookupError> {
        load_class(loader, self.get_nested_string(key, sub_key)?)
    }
}

fn mismatch(key: &str, expected: MappingKind) -> LookupError {
    LookupError::TypeMismatch {
        key: key.to_string(),
        expected,
    }
}

fn load_class(
    loader: &dyn ClassLoader,
    class: String,
) -> std::result::Result<HostClass, LookupError> {
    loader
        .load_class(&class)
        .map_err(|source| LookupError::ClassNotFound { class, source })
}

impl std::fmt::Debug for MappingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current();
        f.debug_struct("MappingCache")
            .field("entries", &snapshot.entries.len())
            .field("build_number", &snapshot.build_number)
            .field("host_version", &self.host_version())
            .finish()
    }
}
