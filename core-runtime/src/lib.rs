//! # Core Runtime Module
//!
//! Runtime infrastructure shared by every instrumentation crate:
//! - Logging and tracing, mirrored into the host log channel
//! - Companion-provided configuration
//! - Cancellable, typed event bus
//! - Translation string table
//!
//! ## Overview
//!
//! Nothing in this crate talks to the host process directly. Configuration
//! and translations arrive through the bridge, events are posted by
//! interception handlers, and log output leaves through a `LoggerSink`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod translation;

pub use error::{Error, Result};
