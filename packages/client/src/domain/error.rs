//! Domain layer error definitions.

use std::fmt;

use thiserror::Error;

use super::{entity::Status, value_object::ConnectionId};

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId invalid format error (not a valid UUID)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),

    /// RoomName validation error
    #[error("RoomName cannot be empty")]
    RoomNameEmpty,

    /// RoomName too long error
    #[error("RoomName cannot exceed {max} bytes (got {actual})")]
    RoomNameTooLong { max: usize, actual: usize },

    /// RoomName contains a forbidden character
    #[error("RoomName cannot contain {0:?}")]
    RoomNameInvalidCharacter(char),

    /// ServerAddress validation error
    #[error("ServerAddress cannot be empty")]
    ServerAddressEmpty,

    /// ServerAddress invalid format error
    #[error("ServerAddress is not a valid host name (got: {0})")]
    ServerAddressInvalid(String),

    /// Nickname validation error
    #[error("Nickname cannot be empty")]
    NicknameEmpty,

    /// Nickname too long error
    #[error("Nickname cannot exceed {max} bytes (got {actual})")]
    NicknameTooLong { max: usize, actual: usize },

    /// Nickname invalid format error
    #[error("Nickname is not valid (got: {0})")]
    NicknameInvalid(String),
}

/// Classification of connection and room failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid address, credentials or timeouts; rejected before any I/O.
    Configuration,
    HostResolution,
    /// TLS or certificate failure.
    TransportSecurity,
    Authentication,
    /// Malformed or unexpected handshake/session data.
    Protocol,
    Timeout,
    /// Read/write failure on the transport.
    Io,
    /// Operation requested in a status that forbids it.
    InvalidState,
    DuplicateRoom,
    /// A connect attempt was interrupted by `disconnect()`.
    Cancelled,
}

impl ErrorKind {
    /// Local, synchronous errors never change the connection status.
    pub fn is_local(&self) -> bool {
        matches!(self, ErrorKind::InvalidState | ErrorKind::DuplicateRoom)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::HostResolution => "host resolution error",
            ErrorKind::TransportSecurity => "transport security error",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "I/O failure",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::DuplicateRoom => "duplicate room",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Consequence of an error for its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Forces the connection into its disconnect sequence.
    Fatal,
    /// Forwarded to observers, no state change.
    Recoverable,
}

/// A classified connection failure.
///
/// Immutable once built. Carrying an error around never changes connection
/// state; the state machine decides what happens next.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ConnectionError {
    kind: ErrorKind,
    message: String,
    cause: Option<String>,
    connection: ConnectionId,
    severity: Severity,
}

impl ConnectionError {
    pub(crate) fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        cause: Option<String>,
        connection: ConnectionId,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            cause,
            connection,
            severity,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered underlying error, if any.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// Errors raised by a transport/protocol collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The host name did not resolve to any address
    #[error("failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    /// TCP connect failed
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// TLS negotiation or certificate validation failed
    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    /// Transport-level or protocol-level handshake failed
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server rejected the presented credentials
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// Mid-session read/write failure
    #[error("I/O failure: {0}")]
    Io(String),

    /// The peer closed the session
    #[error("connection closed by peer")]
    Closed,

    /// A frame could not be decoded
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Errors related to the connection registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No connection registered under the given id
    #[error("Connection not found: {0}")]
    NotFound(ConnectionId),

    /// A connection with the same id is already registered
    #[error("Connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),

    /// Connections may only be dropped from the registry once disconnected
    #[error("Connection {id} is still {status}")]
    StillActive { id: ConnectionId, status: Status },
}
