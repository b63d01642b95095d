//! Keyed one-shot timer wheel
//!
//! Schedules a callback to run once after a delay. Timers are keyed:
//! scheduling for a key that already has a pending timer cancels the old one
//! first, so a key can never double-fire. Callbacks run on spawned tasks and
//! are never invoked synchronously from `schedule` or `cancel`, so callers
//! never need to guard re-entrancy within the same call stack.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct PendingTimer {
    /// Distinguishes this arming from earlier ones for the same key, so a
    /// stale fired task cannot clear a newer timer.
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner<K> {
    pending: Mutex<HashMap<K, PendingTimer>>,
    generations: AtomicU64,
}

/// Cancellable, per-key delayed-callback scheduler
pub struct TimerWheel<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for TimerWheel<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for TimerWheel<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerWheel<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create an empty timer wheel
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Arm a timer for `key`, replacing any pending timer for the same key
    ///
    /// The callback is invoked exactly once after `delay` unless the timer is
    /// cancelled or replaced first. Must be called from within a tokio
    /// runtime.
    pub fn schedule<F>(&self, key: K, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);

        let mut pending = self.inner.pending.lock();
        if let Some(previous) = pending.remove(&key) {
            previous.handle.abort();
        }

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Fire only if this arming is still the current one for the key.
            let current = {
                let mut pending = inner.pending.lock();
                match pending.get(&task_key) {
                    Some(timer) if timer.generation == generation => {
                        pending.remove(&task_key);
                        true
                    }
                    _ => false,
                }
            };

            if current {
                callback();
            }
        });

        pending.insert(key, PendingTimer { generation, handle });
    }

    /// Cancel the pending timer for `key`, if any
    ///
    /// Idempotent; cancelling a key with no pending timer is a no-op.
    /// Returns whether a timer was actually cancelled.
    pub fn cancel(&self, key: &K) -> bool {
        if let Some(timer) = self.inner.pending.lock().remove(key) {
            timer.handle.abort();
            true
        } else {
            false
        }
    }

    /// Number of timers currently pending
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

impl<K> std::fmt::Debug for TimerWheel<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerWheel")
            .field("pending", &self.inner.pending.lock().len())
            .finish()
    }
}
