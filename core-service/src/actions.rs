//! Intent-triggered feature actions.
//!
//! The companion starts actions by resuming the host with an intent whose
//! [`ACTION_EXTRA`] names the action. Intents that arrive before the manager
//! is initialized are queued and dispatched by [`ActionManager::init`].

use bridge_traits::host::IntentData;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Intent extra carrying the action name.
pub const ACTION_EXTRA: &str = "hookbridge.action";

pub type ActionHandler = Arc<dyn Fn(&IntentData) + Send + Sync>;

#[derive(Default)]
pub struct ActionManager {
    handlers: RwLock<HashMap<String, ActionHandler>>,
    ready: AtomicBool,
    pending: Mutex<Vec<IntentData>>,
}

impl ActionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `action`, replacing any previous handler.
    pub fn register<F>(&self, action: impl Into<String>, handler: F)
    where
        F: Fn(&IntentData) + Send + Sync + 'static,
    {
        self.handlers.write().insert(action.into(), Arc::new(handler));
    }

    /// Marks the manager ready and dispatches queued intents in arrival
    /// order. Returns how many found a handler.
    pub fn init(&self) -> usize {
        let pending: Vec<_> = {
            let mut queue = self.pending.lock();
            self.ready.store(true, Ordering::SeqCst);
            queue.drain(..).collect()
        };
        let dispatched = pending.iter().filter(|i| self.dispatch(i)).count();
        info!(dispatched, "Action manager ready");
        dispatched
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Routes intent data from a resume. Returns whether a handler ran.
    pub fn on_new_intent(&self, intent: IntentData) -> bool {
        {
            // `ready` only flips while this lock is held.
            let mut queue = self.pending.lock();
            if !self.is_ready() {
                queue.push(intent);
                return false;
            }
        }
        self.dispatch(&intent)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    fn dispatch(&self, intent: &IntentData) -> bool {
        let Some(name) = intent.extras.get(ACTION_EXTRA) else {
            return false;
        };
        let handler = self.handlers.read().get(name).cloned();
        match handler {
            Some(handler) => {
                debug!(action = %name, "Dispatching action");
                handler(intent);
                true
            }
            None => {
                debug!(action = %name, "No handler for action");
                false
            }
        }
    }
}

impl fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionManager")
            .field("actions", &self.handlers.read().len())
            .field("ready", &self.is_ready())
            .field("pending", &self.pending_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn intent(action: &str) -> IntentData {
        IntentData::new("android.intent.action.MAIN").with_extra(ACTION_EXTRA, action)
    }

    #[test]
    fn test_intents_queue_until_init() {
        let manager = ActionManager::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        manager.register("export_chats", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!manager.on_new_intent(intent("export_chats")));
        assert!(!manager.on_new_intent(intent("unknown")));
        assert_eq!(manager.pending_len(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        assert_eq!(manager.init(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(manager.pending_len(), 0);

        assert!(manager.on_new_intent(intent("export_chats")));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_intent_racing_init_is_dispatched_once() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..500 {
            let manager = Arc::new(ActionManager::new());
            let runs = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&runs);
            manager.register("export_chats", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            let barrier = Arc::new(Barrier::new(2));

            let resumer = {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    manager.on_new_intent(intent("export_chats"));
                })
            };
            barrier.wait();
            manager.init();
            resumer.join().unwrap();

            assert_eq!(runs.load(Ordering::SeqCst), 1);
            assert_eq!(manager.pending_len(), 0);
        }
    }

    #[test]
    fn test_intent_without_action_extra() {
        let manager = ActionManager::new();
        manager.init();
        assert!(!manager.on_new_intent(IntentData::default()));
    }
}
