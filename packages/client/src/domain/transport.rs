//! The opaque send/receive seam between the state machine and the wire.
//!
//! The state machine speaks in [`Outbound`]/[`Inbound`] frames and never
//! sees sockets or encodings. Infrastructure provides the implementations.

use async_trait::async_trait;

use super::{
    error::TransportError,
    value_object::{Endpoint, Nickname, RoomName},
};

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Authenticate {
        nickname: Nickname,
        password: Option<String>,
    },
    Join(RoomName),
    Part(RoomName),
    Ping(String),
    Pong(String),
    Quit(Option<String>),
}

/// Frames received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Welcome {
        nickname: String,
    },
    AuthFailed {
        reason: String,
    },
    Joined {
        room: RoomName,
        topic: Option<String>,
        members: Vec<String>,
    },
    Parted {
        room: RoomName,
    },
    Kicked {
        room: RoomName,
        reason: Option<String>,
    },
    Ping(String),
    Pong(String),
    Error {
        message: String,
    },
}

/// An established session with a chat server.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: Outbound) -> Result<(), TransportError>;

    /// Receive the next frame. `Ok(None)` means the peer closed the session.
    ///
    /// Must be cancel safe: the worker polls it inside `tokio::select!`.
    async fn recv(&mut self) -> Result<Option<Inbound>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports: host resolution, TCP and transport security.
///
/// The protocol handshake on top of the returned transport is driven by
/// the state machine.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError>;
}
