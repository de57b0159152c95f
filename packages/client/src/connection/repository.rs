//! Registry of active connections (repository pattern).
//!
//! Owned by whichever top-level process coordinates connections and passed
//! in explicitly; there is no global instance.

use async_trait::async_trait;

use super::ChatConnection;
use crate::domain::{ConnectionId, RepositoryError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Register a connection under its own id.
    async fn add(&self, connection: ChatConnection) -> Result<(), RepositoryError>;

    /// Look a connection up by id.
    async fn get(&self, id: ConnectionId) -> Result<ChatConnection, RepositoryError>;

    /// Drop a connection from the registry. Only disconnected connections
    /// may be removed.
    async fn remove(&self, id: ConnectionId) -> Result<ChatConnection, RepositoryError>;

    /// All registered connections, ordered by id.
    async fn list(&self) -> Vec<ChatConnection>;

    async fn count(&self) -> usize;
}
