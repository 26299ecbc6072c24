//! # Local Bridge Adapters
//!
//! `FileStore` implementations for hosts where the companion's storage is
//! reachable as a plain directory, and for tests.
//!
//! - [`FsFileStore`]: one file per [`BridgeFileType`](bridge_traits::BridgeFileType)
//!   under a root directory, written with `tokio::fs`
//! - [`MemoryFileStore`]: process-local map

pub mod filesystem;
pub mod memory;

pub use filesystem::FsFileStore;
pub use memory::MemoryFileStore;
