//! Cancellation handle for live reads.

use super::backend::{Store, WatchId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle returned by `subscribe` / `subscribe_document`.
///
/// [`cancel`](Self::cancel) detaches the listener. It is idempotent and
/// safe to call from inside the callback. Once `cancel` returns, the
/// callback is not invoked again, even if a notification was already
/// queued. Dropping the handle does *not* cancel: a subscription lives
/// until it is cancelled or the store goes away.
pub struct Subscription {
    store: Option<Arc<dyn Store>>,
    watch: Option<WatchId>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(store: Arc<dyn Store>, watch: WatchId, active: Arc<AtomicBool>) -> Self {
        Self {
            store: Some(store),
            watch: Some(watch),
            active,
        }
    }

    /// A handle for a registration that never happened.
    pub(crate) fn inert() -> Self {
        Self {
            store: None,
            watch: None,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let (Some(store), Some(id)) = (&self.store, self.watch) {
            store.unwatch(id);
            tracing::debug!(watch = id.0, "subscription cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("watch", &self.watch)
            .field("active", &self.is_active())
            .finish()
    }
}
