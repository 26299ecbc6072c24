//! Symbol Scanner Contract
//!
//! The scanner walks the compiled host package and returns a document of
//! named entries. How it finds them is its own business; the core only
//! caches, versions, and reads the result.

use std::path::Path;

/// Scanner output: entry name to scalar, list, or map value.
pub type ScanDocument = serde_json::Map<String, serde_json::Value>;

/// Extracts symbol mappings from a host binary.
///
/// Scanning is CPU heavy and synchronous; callers run it on a blocking
/// thread.
pub trait SymbolScanner: Send + Sync {
    fn scan(&self, binary: &Path) -> anyhow::Result<ScanDocument>;
}
