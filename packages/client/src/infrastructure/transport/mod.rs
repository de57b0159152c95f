//! Implementations of the [`Connector`](crate::domain::Connector) /
//! [`Transport`](crate::domain::Transport) seam.

pub mod loopback;
pub mod websocket;

pub use loopback::{LoopbackConnector, LoopbackPeer, LoopbackServer, loopback};
pub use websocket::{WebSocketConnector, WebSocketTransport};
