//! Runtime handles and the blocking bridge.
//!
//! Host lifecycle callbacks arrive on threads the core does not own. Some of
//! them need a definite outcome from an async sequence before returning, so
//! [`block_on`] drives a future to completion on a private current-thread
//! runtime. When the caller is already inside a Tokio runtime the future is
//! driven from a scoped helper thread, because nesting `block_on` inside a
//! runtime worker panics.

use std::future::Future;
use std::io;
use std::thread;

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion and returns its output.
///
/// # Errors
///
/// Fails when the private runtime cannot be built or the helper thread
/// panicked while driving the future.
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_err() {
        return drive(future);
    }

    thread::scope(|scope| {
        scope
            .spawn(|| drive(future))
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "block_on helper thread panicked"))?
    })
}

fn drive<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Returns the handle of the runtime the caller is running on, if any.
pub fn current_handle() -> Option<Handle> {
    Handle::try_current().ok()
}

/// Builds a multi-threaded runtime sized for background work inside a host
/// process.
///
/// Worker threads are named so they are recognisable in host thread dumps.
pub fn build_background_runtime(worker_threads: usize) -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .thread_name("hookbridge-worker")
        .enable_all()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_outside_runtime() {
        let value = block_on(async { 7 }).unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn block_on_inside_runtime_uses_helper_thread() {
        let value = block_on(async { "nested" }).unwrap();
        assert_eq!(value, "nested");
    }

    #[test]
    fn background_runtime_spawns() {
        let runtime = build_background_runtime(0).unwrap();
        let handle = runtime.handle().clone();
        let result = runtime.block_on(async move { handle.spawn(async { 3 }).await.unwrap() });
        assert_eq!(result, 3);
    }
}
