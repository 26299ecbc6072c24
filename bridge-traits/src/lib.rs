//! # Host Bridge Traits
//!
//! Contracts for every collaborator the instrumentation core consumes but does
//! not implement.
//!
//! ## Overview
//!
//! The core runs inside a third-party host process. Everything that touches
//! the host runtime, the companion service, or the method-interception engine
//! is reached through a trait defined here, so the core itself stays a set of
//! plain, testable state machines.
//!
//! ## Traits
//!
//! ### Companion service
//! - [`BridgeClient`](bridge::BridgeClient) - Async RPC channel to the companion service
//! - [`SyncCallback`](bridge::SyncCallback) - Directory lookups answered on behalf of the companion
//! - [`FileStore`](storage::FileStore) - Bridge-backed files (mappings, config, translations)
//!
//! ### Host process
//! - [`HostContext`](host::HostContext) - Package metadata, fatal reporting, soft restart
//! - [`ClassLoader`](host::ClassLoader) - Resolves mapped class names to host classes
//! - [`ForegroundEntry`](host::ForegroundEntry) - A foreground entry point (activity) instance
//! - [`SessionStore`](session::SessionStore) - Read-only access to the host's local session data
//!
//! ### Instrumentation
//! - [`HookRegistry`](hooks::HookRegistry) - Registers method interceptions
//! - [`NativeBridge`](native::NativeBridge) - Native unary-call interception
//! - [`SymbolScanner`](scanner::SymbolScanner) - Extracts symbol mappings from the host binary
//! - [`ScriptRuntime`](scripting::ScriptRuntime) - External scripting modules
//!
//! ### Presentation and logging
//! - [`Screen`](screen::Screen) - A setup wizard screen
//! - [`LoggerSink`](log::LoggerSink) - Forwards structured logs to the host log channel
//!
//! ## Error Handling
//!
//! Every fallible bridge call returns [`BridgeError`](error::BridgeError). A
//! failed call is always an `Err`, never an empty success, so callers can tell
//! "the companion said nothing" apart from "the companion could not be
//! reached".
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; host callbacks arrive on arbitrary
//! threads and implementations are shared through `Arc`.

pub mod bridge;
pub mod error;
pub mod hooks;
pub mod host;
pub mod log;
pub mod native;
pub mod scanner;
pub mod screen;
pub mod scripting;
pub mod session;
pub mod storage;

pub use error::BridgeError;

pub use bridge::{BridgeClient, ConnectCallback, SyncCallback, BRIDGE_SYNC_ACTION};
pub use hooks::{
    HookCall, HookGate, HookHandle, HookHandler, HookRegistry, HookStage, HookTarget,
    MethodSignature,
};
pub use host::{
    ClassLoader, EntryId, ForegroundEntry, HostClass, HostContext, IntentData, PackageInfo,
};
pub use log::{LogEntry, LogLevel, LoggerSink, StderrSink};
pub use native::{NativeBridge, NativeRequest, UnaryCallInterceptor};
pub use scanner::{ScanDocument, SymbolScanner};
pub use screen::{NextGate, Screen};
pub use scripting::{ScriptRuntime, ScriptingInterface};
pub use session::{FeedEntry, FriendInfo, SessionStore};
pub use storage::{BridgeFileType, FileStore};
