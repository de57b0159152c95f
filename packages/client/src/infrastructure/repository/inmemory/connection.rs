//! In-memory connection registry.
//!
//! Holds `ChatConnection` handles keyed by id. The registry owns a handle,
//! so a registered connection keeps its worker alive until it is removed.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    connection::{ChatConnection, ConnectionRepository},
    domain::{ConnectionId, RepositoryError, Status},
};

#[derive(Default, Clone)]
pub struct InMemoryConnectionRepository {
    connections: Arc<Mutex<HashMap<ConnectionId, ChatConnection>>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn add(&self, connection: ChatConnection) -> Result<(), RepositoryError> {
        let mut connections = self.connections.lock().await;
        let id = connection.id();
        if connections.contains_key(&id) {
            return Err(RepositoryError::AlreadyRegistered(id));
        }
        connections.insert(id, connection);
        tracing::debug!(connection = %id, total = connections.len(), "Connection registered");
        Ok(())
    }

    async fn get(&self, id: ConnectionId) -> Result<ChatConnection, RepositoryError> {
        let connections = self.connections.lock().await;
        connections
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn remove(&self, id: ConnectionId) -> Result<ChatConnection, RepositoryError> {
        let mut connections = self.connections.lock().await;
        let status = connections
            .get(&id)
            .map(ChatConnection::current_status)
            .ok_or(RepositoryError::NotFound(id))?;
        if status != Status::Disconnected {
            return Err(RepositoryError::StillActive { id, status });
        }
        let removed = connections
            .remove(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        tracing::debug!(connection = %id, total = connections.len(), "Connection unregistered");
        Ok(removed)
    }

    async fn list(&self) -> Vec<ChatConnection> {
        let connections = self.connections.lock().await;
        let mut list: Vec<ChatConnection> = connections.values().cloned().collect();
        list.sort_by_key(ChatConnection::id);
        list
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}
