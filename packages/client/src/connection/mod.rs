//! The connection core: one [`ChatConnection`] per chat network.
//!
//! A `ChatConnection` is a cheap, cloneable handle. The state lives on a
//! dedicated worker task ([`ConnectionStateMachine`]) that owns the
//! transport, the status and the room roster; the handle only enqueues
//! commands and reads snapshots.

pub mod config;
pub mod dispatcher;
pub mod reporter;
pub mod repository;
pub mod state_machine;
pub mod tracker;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

pub use config::{
    ConfigError, ConnectionConfig, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_KEEPALIVE_INTERVAL,
    DEFAULT_KEEPALIVE_TIMEOUT, DEFAULT_LEAVE_TIMEOUT,
};
pub use dispatcher::NotificationDispatcher;
pub use reporter::ErrorReporter;
pub use repository::ConnectionRepository;
pub use state_machine::ConnectionStateMachine;
pub use tracker::{MembershipError, RoomMembershipTracker};

use crate::domain::{
    ChatRoom, ConnectionError, ConnectionIdFactory, ConnectionId, ConnectionObserver, Connector,
    ErrorKind, ObserverId, RoomName, Severity, Status,
};
use state_machine::Command;

struct Inner {
    id: ConnectionId,
    config: ConnectionConfig,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<Status>,
    rooms: watch::Receiver<Vec<ChatRoom>>,
    dispatcher: Arc<NotificationDispatcher>,
}

/// Handle to one connection and its worker.
///
/// Dropping the last handle disconnects (if needed) and stops the worker.
#[derive(Clone)]
pub struct ChatConnection {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChatConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConnection")
            .field("id", &self.inner.id)
            .field("server", &self.inner.config.server)
            .field("port", &self.inner.config.port)
            .field("status", &self.current_status())
            .finish()
    }
}

impl ChatConnection {
    /// Create a connection in `Disconnected` and start its worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self::with_id(ConnectionIdFactory::generate(), config, connector)
    }

    pub fn with_id(
        id: ConnectionId,
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(Status::Disconnected);
        let dispatcher = Arc::new(NotificationDispatcher::new(id));
        let tracker = RoomMembershipTracker::new(Arc::clone(&dispatcher));
        let rooms_rx = tracker.subscribe();

        let machine = ConnectionStateMachine::new(
            id,
            config.clone(),
            connector,
            status_tx,
            tracker,
            Arc::clone(&dispatcher),
            command_rx,
        );
        tokio::spawn(machine.run());
        tracing::debug!(connection = %id, server = %config.server, port = config.port, "Connection created");

        Self {
            inner: Arc::new(Inner {
                id,
                config,
                commands: command_tx,
                status: status_rx,
                rooms: rooms_rx,
                dispatcher,
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Ask the worker to connect. Returns immediately with the status at
    /// call time; the outcome arrives as events. A no-op unless
    /// `Disconnected`.
    pub fn connect(&self) -> Status {
        let status = self.current_status();
        self.enqueue(Command::Connect);
        status
    }

    /// Ask the worker to disconnect, or to cancel an attempt in progress.
    /// Returns immediately with the status at call time. A no-op while
    /// `Disconnected` or `Disconnecting`.
    pub fn disconnect(&self) -> Status {
        let status = self.current_status();
        self.enqueue(Command::Disconnect { done: None });
        status
    }

    /// Disconnect and wait until the worker has settled in `Disconnected`.
    ///
    /// Commands queued before this one are handled first, so a pending
    /// connect is cancelled (and its events delivered) before this returns.
    /// Returns the status once settled.
    pub async fn disconnect_and_wait(&self) -> Status {
        let (done, settled) = oneshot::channel();
        if self
            .inner
            .commands
            .send(Command::Disconnect { done: Some(done) })
            .is_ok()
        {
            // An error means the worker is gone, which only happens once
            // Disconnected.
            let _ = settled.await;
        }
        self.current_status()
    }

    /// Request a room. Resolves once the request is on the wire; the room
    /// shows up in [`joined_rooms`](Self::joined_rooms) when the server
    /// confirms it.
    pub async fn join(&self, room: RoomName) -> Result<(), ConnectionError> {
        let (reply, response) = oneshot::channel();
        self.request(Command::Join { room, reply }, response, "join a room")
            .await
    }

    /// Leave a room. Parting a room that is not joined succeeds silently.
    pub async fn part(&self, room: RoomName) -> Result<(), ConnectionError> {
        let (reply, response) = oneshot::channel();
        self.request(Command::Part { room, reply }, response, "part a room")
            .await
    }

    pub fn current_status(&self) -> Status {
        *self.inner.status.borrow()
    }

    /// Snapshot of the roster, in join order.
    pub fn joined_rooms(&self) -> Vec<ChatRoom> {
        self.inner.rooms.borrow().clone()
    }

    pub fn register_observer(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverId {
        self.inner.dispatcher.register(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.dispatcher.remove(id)
    }

    /// Status updates as a watch channel.
    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.inner.status.clone()
    }

    /// Roster updates as a watch channel.
    pub fn subscribe_rooms(&self) -> watch::Receiver<Vec<ChatRoom>> {
        self.inner.rooms.clone()
    }

    /// Wait until the status equals `target`. Returns `false` if the worker
    /// went away first.
    pub async fn wait_for_status(&self, target: Status) -> bool {
        let mut status = self.subscribe_status();
        status.wait_for(|current| *current == target).await.is_ok()
    }

    fn enqueue(&self, command: Command) {
        if self.inner.commands.send(command).is_err() {
            tracing::warn!(connection = %self.inner.id, "Connection worker has stopped; command dropped");
        }
    }

    async fn request(
        &self,
        command: Command,
        response: oneshot::Receiver<Result<(), ConnectionError>>,
        operation: &str,
    ) -> Result<(), ConnectionError> {
        if self.inner.commands.send(command).is_err() {
            return Err(self.worker_stopped(operation));
        }
        response
            .await
            .unwrap_or_else(|_| Err(self.worker_stopped(operation)))
    }

    fn worker_stopped(&self, operation: &str) -> ConnectionError {
        ConnectionError::new(
            ErrorKind::InvalidState,
            format!("cannot {}: the connection worker has stopped", operation),
            None,
            self.inner.id,
            Severity::Recoverable,
        )
    }
}
