//! Async runtime facade for the hookbridge crates.
//!
//! Every other crate in the workspace goes through this one instead of naming
//! Tokio directly. Keeping the executor behind a single crate means the host
//! adapter decides how background work is scheduled, and the core only ever
//! sees a [`runtime::Handle`].
//!
//! # Modules
//!
//! - `runtime`: runtime handles and the blocking bridge used by the init sequence
//! - `task`: task spawning and join handles
//! - `time`: sleeps, timeouts and instants
//! - `sync`: async-aware locks and channels
//!
//! # Examples
//!
//! ```rust
//! use core_async::runtime;
//! use core_async::time::{sleep, Duration};
//!
//! let value = runtime::block_on(async {
//!     sleep(Duration::from_millis(1)).await;
//!     42
//! })
//! .unwrap();
//! assert_eq!(value, 42);
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
