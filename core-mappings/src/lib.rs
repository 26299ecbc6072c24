//! # Mapping Cache Module
//!
//! Resolved symbol names for the installed host build.
//!
//! ## Overview
//!
//! The host binary is obfuscated and its internals are renamed between
//! releases. A [`SymbolScanner`](bridge_traits::SymbolScanner) extracts the
//! current names once; the result is persisted through the companion and
//! versioned with the host build number so later starts can load it without
//! rescanning.
//!
//! - [`MappingEntry`]: closed scalar/list/map variant with checked accessors
//! - [`MappingDocument`]: the persisted JSON form
//! - [`MappingCache`]: load, refresh, staleness and lookups

pub mod cache;
pub mod document;
pub mod entry;
pub mod error;

pub use cache::MappingCache;
pub use document::{MappingDocument, BUILD_NUMBER_KEY};
pub use entry::{MappingEntry, MappingKind};
pub use error::{CacheError, LookupError, Result};
