//! Task spawning.
//!
//! Thin re-exports of Tokio's task API. `spawn` requires an ambient runtime;
//! code that runs on host threads should spawn through a stored
//! [`Handle`](crate::runtime::Handle) instead.

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current runtime.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
