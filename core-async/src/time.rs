//! Time-related helpers.

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
pub use tokio::time::{error::Elapsed, interval, sleep, timeout, Interval, Sleep, Timeout};

/// Runs `future` and reports how long it took.
///
/// Used to time the bootstrap stages without sprinkling `Instant::now()`
/// through the orchestrator.
pub async fn measure<F>(future: F) -> (F::Output, Duration)
where
    F: std::future::Future,
{
    let start = Instant::now();
    let output = future.await;
    (output, start.elapsed())
}

/// Runs `f` synchronously and reports how long it took.
pub fn measure_sync<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let output = f();
    (output, start.elapsed())
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
