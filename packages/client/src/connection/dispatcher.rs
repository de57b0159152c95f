//! Ordered delivery of connection events to registered observers.

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::{ConnectionEvent, ConnectionId, ConnectionObserver, ObserverId};

/// Fans events out to every registered observer, in production order.
///
/// Only the connection's worker dispatches, so events leave in exactly the
/// order the state machine produced them. Registration and removal may
/// happen from any context, including from inside an observer callback:
/// delivery iterates over a snapshot of the list taken before the first
/// callback runs, so an observer added during delivery starts with the
/// next event.
pub struct NotificationDispatcher {
    connection: ConnectionId,
    observers: Mutex<Vec<(ObserverId, Arc<dyn ConnectionObserver>)>>,
}

impl NotificationDispatcher {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverId {
        let id = ObserverId::next();
        self.lock().push((id, observer));
        tracing::debug!(connection = %self.connection, ?id, "Observer registered");
        id
    }

    /// Returns `false` when the id was not registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        let removed = observers.len() != before;
        if removed {
            tracing::debug!(connection = %self.connection, ?id, "Observer removed");
        }
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver one event to every observer.
    pub fn dispatch(&self, event: ConnectionEvent) {
        tracing::debug!(connection = %self.connection, event = event.name(), "Dispatching {:?}", event);

        // Release the lock before calling out.
        let observers: Vec<Arc<dyn ConnectionObserver>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer.on_event(&event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ObserverId, Arc<dyn ConnectionObserver>)>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
