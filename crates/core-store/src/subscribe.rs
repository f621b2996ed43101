//! Reactive binding: a minimal subscriber registry.
//!
//! Subscribers are zero-argument callbacks; notification carries no payload,
//! observers re-load the full state for a fresh snapshot. Fan-out is
//! synchronous and panic-isolated so one misbehaving observer cannot starve
//! the rest.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Opaque handle returned by `subscribe`, consumed by `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub(crate) fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|(sid, _)| *sid != id.0);
    }

    /// Synchronous fan-out. Callbacks run outside the lock so a subscriber
    /// may subscribe/unsubscribe re-entrantly.
    pub(crate) fn notify(&self) {
        let snapshot: Vec<(u64, Callback)> = self
            .subscribers
            .lock()
            .expect("subscriber list poisoned")
            .clone();
        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!(target: "store.notify", subscriber = id, "subscriber_panicked");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .len()
    }
}
