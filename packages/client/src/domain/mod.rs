//! Domain layer for the chat client.
//!
//! Business types and the traits at the seams, independent of sockets,
//! encodings and the user interface.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod transport;
pub mod value_object;

pub use entity::{ChatRoom, Status};
pub use error::{
    ConnectionError, ErrorKind, RepositoryError, Severity, TransportError, ValueObjectError,
};
pub use event::{ConnectionEvent, ConnectionObserver, ObserverId};
pub use factory::ConnectionIdFactory;
pub use transport::{Connector, Inbound, Outbound, Transport};
pub use value_object::{
    ConnectionId, Credentials, ENDPOINT_PATH, Endpoint, Nickname, RoomName, ServerAddress,
    Timestamp, TransportSecurity,
};
