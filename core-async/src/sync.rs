//! Synchronization primitives.
//!
//! Async-aware locks and channels. Anything held across an `.await` must use
//! these rather than blocking locks.

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, OnceCell, RwLock,
    RwLockReadGuard, RwLockWriteGuard, Semaphore,
};
