//! Ordered roster of the rooms joined on one connection.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::dispatcher::NotificationDispatcher;
use crate::domain::{ChatRoom, ConnectionEvent, ErrorKind, RoomName, Status};

/// Rejected roster mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("room membership cannot change while {0}")]
    InvalidState(Status),

    #[error("room {0} is already joined")]
    DuplicateRoom(RoomName),
}

impl MembershipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MembershipError::InvalidState(_) => ErrorKind::InvalidState,
            MembershipError::DuplicateRoom(_) => ErrorKind::DuplicateRoom,
        }
    }
}

/// Insertion-ordered set of joined rooms, unique by case-insensitive name.
///
/// The roster lives in a `watch` channel: the owning worker is the only
/// writer, and readers get whole snapshots.
pub struct RoomMembershipTracker {
    rooms: watch::Sender<Vec<ChatRoom>>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl RoomMembershipTracker {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        let (rooms, _) = watch::channel(Vec::new());
        Self { rooms, dispatcher }
    }

    /// Read-only view for collaborators.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatRoom>> {
        self.rooms.subscribe()
    }

    pub fn snapshot(&self) -> Vec<ChatRoom> {
        self.rooms.borrow().clone()
    }

    pub fn contains(&self, name: &RoomName) -> bool {
        self.rooms.borrow().iter().any(|room| room.name.matches(name))
    }

    pub fn len(&self) -> usize {
        self.rooms.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.borrow().is_empty()
    }

    /// Append a room and emit `RoomJoined`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless `status` is `Connected`
    /// - `DuplicateRoom` if a room with the same name (any case) is joined
    pub fn add_joined_room(&mut self, status: Status, room: ChatRoom) -> Result<(), MembershipError> {
        if !status.is_connected() {
            return Err(MembershipError::InvalidState(status));
        }
        if self.contains(&room.name) {
            return Err(MembershipError::DuplicateRoom(room.name));
        }

        self.rooms.send_modify(|rooms| rooms.push(room.clone()));
        tracing::info!(connection = %room.connection, room = %room.name, "Joined room");
        self.dispatcher.dispatch(ConnectionEvent::RoomJoined(room));
        Ok(())
    }

    /// Remove a room by name and emit `RoomParted`.
    ///
    /// Removing a room that is not joined is a silent no-op: the server's
    /// authoritative leave (a kick, say) may race a local part.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `status` is `Connected`
    pub fn remove_joined_room(
        &mut self,
        status: Status,
        name: &RoomName,
    ) -> Result<Option<ChatRoom>, MembershipError> {
        if !status.is_connected() {
            return Err(MembershipError::InvalidState(status));
        }

        let mut removed = None;
        self.rooms.send_if_modified(|rooms| {
            let position = rooms.iter().position(|room| room.name.matches(name));
            removed = position.map(|index| rooms.remove(index));
            removed.is_some()
        });

        match &removed {
            Some(room) => {
                tracing::info!(connection = %room.connection, room = %room.name, "Parted room");
                self.dispatcher
                    .dispatch(ConnectionEvent::RoomParted(room.clone()));
            }
            None => tracing::debug!(room = %name, "Part for a room that is not joined; ignoring"),
        }
        Ok(removed)
    }

    /// Remove every room, oldest first, emitting one `RoomParted` each.
    ///
    /// Only the disconnect sequence calls this, so there is no status check.
    pub fn clear_all(&mut self) -> usize {
        let mut cleared = 0;
        while let Some(room) = self.pop_oldest() {
            self.dispatcher.dispatch(ConnectionEvent::RoomParted(room));
            cleared += 1;
        }
        cleared
    }

    fn pop_oldest(&mut self) -> Option<ChatRoom> {
        let mut popped = None;
        self.rooms.send_if_modified(|rooms| {
            if rooms.is_empty() {
                return false;
            }
            popped = Some(rooms.remove(0));
            true
        });
        popped
    }
}
