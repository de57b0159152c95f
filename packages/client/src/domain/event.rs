//! Events delivered to collaborators, and the observer interface.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{entity::ChatRoom, entity::Status, error::ConnectionError};

/// Lifecycle and membership events, in the order the state machine produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    StatusChanged(Status),
    Error(ConnectionError),
    RoomJoined(ChatRoom),
    RoomParted(ChatRoom),
}

impl ConnectionEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::StatusChanged(_) => "status-changed",
            ConnectionEvent::Error(_) => "error",
            ConnectionEvent::RoomJoined(_) => "room-joined",
            ConnectionEvent::RoomParted(_) => "room-parted",
        }
    }
}

/// Receives connection events.
///
/// Every method defaults to a no-op, so an observer only implements the
/// events it cares about. Callbacks run on the connection's worker; they
/// must not block.
pub trait ConnectionObserver: Send + Sync {
    fn on_status_changed(&self, _status: Status) {}

    fn on_error(&self, _error: &ConnectionError) {}

    fn on_room_joined(&self, _room: &ChatRoom) {}

    fn on_room_parted(&self, _room: &ChatRoom) {}

    /// Route an event to the matching callback.
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::StatusChanged(status) => self.on_status_changed(*status),
            ConnectionEvent::Error(error) => self.on_error(error),
            ConnectionEvent::RoomJoined(room) => self.on_room_joined(room),
            ConnectionEvent::RoomParted(room) => self.on_room_parted(room),
        }
    }
}

/// Handle returned by observer registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}
