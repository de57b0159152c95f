//! UseCase 層のエラー型

use std::time::Duration;

use thiserror::Error;

use crate::{
    connection::ConfigError,
    domain::{ConnectionError, ConnectionId, RepositoryError},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    /// Rejected before any I/O
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Raised by the connection itself (invalid state, duplicate room, ...)
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("Connection {id} did not disconnect within {after:?}")]
    CloseTimedOut { id: ConnectionId, after: Duration },
}

impl From<RepositoryError> for UseCaseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(id) => UseCaseError::ConnectionNotFound(id),
            other => UseCaseError::Repository(other),
        }
    }
}
