//! Push-based snapshot feed used by store implementations.
//!
//! # Responsibility
//! - Fan out full collection snapshots to registered listeners.
//! - Hand out `Subscription` handles that tear down exactly once.
//!
//! # Invariants
//! - Listeners run in registration order, on the publishing thread.
//! - Listeners must not subscribe or unsubscribe from inside a callback.

use crate::model::move_record::Move;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback receiving the full, newest-first collection after each write.
pub type SnapshotListener = Box<dyn FnMut(&[Move]) + Send>;

#[derive(Default)]
struct FeedInner {
    next_id: u64,
    listeners: BTreeMap<u64, SnapshotListener>,
}

/// Shared listener registry owned by a store.
#[derive(Clone, Default)]
pub struct SnapshotFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It does not receive the current state; callers
    /// read an initial snapshot themselves.
    pub fn subscribe(&self, listener: SnapshotListener) -> Subscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, listener);
        debug!(
            "event=feed_subscribe module=repo status=ok listeners={}",
            inner.listeners.len()
        );
        Subscription {
            feed: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Delivers one snapshot to every listener.
    pub fn publish(&self, snapshot: &[Move]) {
        let mut inner = lock(&self.inner);
        for listener in inner.listeners.values_mut() {
            listener(snapshot);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Handle for one registered listener.
///
/// Unsubscribes on `unsubscribe()` or drop, whichever comes first.
pub struct Subscription {
    feed: Weak<Mutex<FeedInner>>,
    id: Option<u64>,
}

impl Subscription {
    /// Tears the listener down. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        let Some(feed) = self.feed.upgrade() else {
            return false;
        };
        let removed = lock(&feed).listeners.remove(&id).is_some();
        debug!("event=feed_unsubscribe module=repo status=ok removed={removed}");
        removed
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.feed.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// A panicking listener must not wedge the store.
fn lock(inner: &Mutex<FeedInner>) -> MutexGuard<'_, FeedInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
