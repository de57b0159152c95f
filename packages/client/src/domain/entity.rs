//! Core domain models for the connection layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, RoomName, Timestamp};

/// Lifecycle status of a connection.
///
/// Transitions form the cycle
/// `Disconnected → Connecting → {Connected | Disconnected}`,
/// `Connected → Disconnecting → Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl Status {
    pub fn is_connected(&self) -> bool {
        matches!(self, Status::Connected)
    }

    /// Whether `self → next` is an edge of the lifecycle cycle.
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Disconnected, Status::Connecting)
                | (Status::Connecting, Status::Connected)
                | (Status::Connecting, Status::Disconnected)
                | (Status::Connected, Status::Disconnecting)
                | (Status::Disconnecting, Status::Disconnected)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Disconnected => "disconnected",
            Status::Connecting => "connecting",
            Status::Connected => "connected",
            Status::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// A conversational room joined on one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Room name (case-insensitive)
    pub name: RoomName,
    /// Topic, when the server announced one
    pub topic: Option<String>,
    /// Membership roster as reported by the server
    pub members: Vec<String>,
    /// Owning connection (non-owning back-reference)
    pub connection: ConnectionId,
    /// When the join was confirmed
    pub joined_at: Timestamp,
}

impl ChatRoom {
    /// Create a room with no topic and an empty roster
    pub fn new(name: RoomName, connection: ConnectionId, joined_at: Timestamp) -> Self {
        Self {
            name,
            topic: None,
            members: Vec::new(),
            connection,
            joined_at,
        }
    }

    /// Set the topic
    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    /// Set the membership roster
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }
}
