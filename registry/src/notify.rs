use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::trace;

/// Delivered to observers after a commit's state is published.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommitEvent {
    pub updated_at: DateTime<Utc>,
}

/// Receives commit events. Handlers run on the committing thread and must
/// not write to the registry.
pub trait Observer: Send + Sync {
    fn on_commit(&self, event: &CommitEvent);
}

/// Handle for dropping a subscription.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The registry's commit-notification subject.
#[derive(Default)]
pub struct Subject {
    next_id: AtomicU64,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn Observer>)>>,
}

// === impl Subject ===

impl Subject {
    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Unsubscribing an already-removed id is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers
            .write()
            .retain(|(subscribed, _)| *subscribed != id);
    }

    /// Delivers `event` to every current observer, in subscription order.
    pub fn notify(&self, event: &CommitEvent) {
        let observers = self.observers.read();
        trace!(observers = observers.len(), "Notifying");
        for (_, observer) in observers.iter() {
            observer.on_commit(event);
        }
    }
}
