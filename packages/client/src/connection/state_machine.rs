//! The per-connection worker.
//!
//! One task per connection owns the transport, the status and the room
//! roster. Collaborator commands arrive on a queue and are handled one at a
//! time between network events, so commands never race in-flight I/O.
//!
//! Lifecycle:
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──welcome──▶ Connected
//!      ▲                        │                       │
//!      └──── did not connect ───┘                       │ disconnect / fatal error
//!      ▲                                                ▼
//!      └───────────────────────────────────────── Disconnecting
//! ```

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, MissedTickBehavior},
};

use super::{
    config::ConnectionConfig, dispatcher::NotificationDispatcher, reporter::ErrorReporter,
    tracker::RoomMembershipTracker,
};
use crate::domain::{
    ChatRoom, ConnectionError, ConnectionEvent, ConnectionId, Connector, ErrorKind, Inbound,
    Outbound, RoomName, Status, Timestamp, Transport, TransportError,
};

pub(crate) type Reply = oneshot::Sender<Result<(), ConnectionError>>;

/// Signalled once the worker is back in `Disconnected`.
pub(crate) type Settled = oneshot::Sender<()>;

/// Requests funneled from collaborators to the worker.
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect { done: Option<Settled> },
    Join { room: RoomName, reply: Reply },
    Part { room: RoomName, reply: Reply },
}

/// How a connected session ended.
enum SessionEnd {
    /// `disconnect()` was called, or every handle was dropped.
    Requested,
    /// A fatal error; the graceful leave is skipped.
    Failed(ConnectionError),
}

pub struct ConnectionStateMachine {
    id: ConnectionId,
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    status: watch::Sender<Status>,
    tracker: RoomMembershipTracker,
    reporter: ErrorReporter,
    dispatcher: Arc<NotificationDispatcher>,
    commands: mpsc::UnboundedReceiver<Command>,
    waiters: Vec<Settled>,
}

impl ConnectionStateMachine {
    pub(crate) fn new(
        id: ConnectionId,
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
        status: watch::Sender<Status>,
        tracker: RoomMembershipTracker,
        dispatcher: Arc<NotificationDispatcher>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let reporter = ErrorReporter::new(id, Arc::clone(&dispatcher));
        Self {
            id,
            config,
            connector,
            status,
            tracker,
            reporter,
            dispatcher,
            commands,
            waiters: Vec::new(),
        }
    }

    /// Serve commands until every handle is dropped.
    pub(crate) async fn run(mut self) {
        tracing::debug!(connection = %self.id, "Connection worker started");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Connect => self.connect().await,
                Command::Disconnect { done } => {
                    tracing::debug!(connection = %self.id, "Already disconnected; ignoring disconnect");
                    self.park(done);
                }
                Command::Join { reply, .. } => self.reject(reply, "join a room"),
                Command::Part { reply, .. } => self.reject(reply, "part a room"),
            }
            // Every command above ends in Disconnected.
            self.release_waiters();
        }
        tracing::debug!(connection = %self.id, "Connection worker stopped");
    }

    fn current_status(&self) -> Status {
        *self.status.borrow()
    }

    /// Publish a new status snapshot. Does not emit `StatusChanged`.
    fn transition(&mut self, next: Status) {
        let current = self.current_status();
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next}"
        );
        if !current.can_transition_to(next) {
            tracing::error!(connection = %self.id, %current, %next, "Illegal status transition");
        }
        self.status.send_replace(next);
        tracing::info!(connection = %self.id, from = %current, to = %next, "Status changed");
    }

    fn emit_status(&self) {
        self.dispatcher
            .dispatch(ConnectionEvent::StatusChanged(self.current_status()));
    }

    /// Hold a disconnect acknowledgement until the worker is `Disconnected`.
    fn park(&mut self, done: Option<Settled>) {
        if let Some(done) = done {
            self.waiters.push(done);
        }
    }

    fn release_waiters(&mut self) {
        for done in self.waiters.drain(..) {
            let _ = done.send(());
        }
    }

    /// Handle a command that arrives while the session is going away.
    /// `connect()` is a no-op until `Disconnected` is reached.
    fn refuse_while_disconnecting(&mut self, command: Command) {
        match command {
            Command::Connect => {
                tracing::debug!(connection = %self.id, "Disconnecting; ignoring connect")
            }
            Command::Disconnect { done } => self.park(done),
            Command::Join { reply, .. } => self.reject(reply, "join a room"),
            Command::Part { reply, .. } => self.reject(reply, "part a room"),
        }
    }

    /// Answer a membership request that arrived in the wrong status.
    fn reject(&self, reply: Reply, operation: &str) {
        let error = self.reporter.invalid_state(operation, self.current_status());
        self.post_error(&error);
        let _ = reply.send(Err(error));
    }

    // ---- lifecycle hooks ----

    fn will_connect(&mut self) {
        self.transition(Status::Connecting);
        tracing::info!(
            connection = %self.id,
            url = %self.config.endpoint_url(),
            nickname = %self.config.credentials.nickname,
            "Connecting"
        );
        self.emit_status();
    }

    fn did_connect(&mut self, nickname: &str) {
        self.transition(Status::Connected);
        tracing::info!(connection = %self.id, nickname, "Connected");
        self.emit_status();
    }

    fn did_not_connect(&mut self, error: ConnectionError) {
        self.transition(Status::Disconnected);
        tracing::info!(connection = %self.id, kind = ?error.kind(), "Did not connect");
        self.post_error(&error);
        self.emit_status();
    }

    fn will_disconnect(&mut self) {
        self.transition(Status::Disconnecting);
        tracing::info!(connection = %self.id, rooms = self.tracker.len(), "Disconnecting");
        self.emit_status();
    }

    fn did_disconnect(&mut self, parted: usize) {
        tracing::info!(connection = %self.id, parted, "Disconnected");
    }

    fn post_error(&self, error: &ConnectionError) {
        self.reporter.report(error);
    }

    // ---- connecting ----

    async fn connect(&mut self) {
        self.will_connect();

        if let Err(e) = self.config.validate() {
            let error = self.reporter.from_config(&e, Status::Connecting);
            self.did_not_connect(error);
            return;
        }

        match self.handshake().await {
            Ok((transport, nickname)) => {
                self.did_connect(&nickname);
                self.session(transport).await;
            }
            Err(error) => self.did_not_connect(error),
        }
    }

    /// Resolution, transport security and authentication, bounded by the
    /// handshake timeout. A `Disconnect` (or every handle going away) aborts
    /// the attempt at its next await point.
    async fn handshake(&mut self) -> Result<(Box<dyn Transport>, String), ConnectionError> {
        let attempt = tokio::time::timeout(
            self.config.handshake_timeout,
            establish(Arc::clone(&self.connector), self.config.clone()),
        );
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Disconnect { done }) => {
                        self.park(done);
                        return Err(self.cancelled());
                    }
                    None => return Err(self.cancelled()),
                    Some(Command::Connect) => {
                        tracing::debug!(connection = %self.id, "Connect already in progress; ignoring")
                    }
                    Some(Command::Join { reply, .. }) => self.reject(reply, "join a room"),
                    Some(Command::Part { reply, .. }) => self.reject(reply, "part a room"),
                },
                result = &mut attempt => {
                    return match result {
                        Ok(Ok(established)) => Ok(established),
                        Ok(Err(e)) => Err(self.reporter.from_transport(&e, Status::Connecting)),
                        Err(_) => Err(self.reporter.timeout(
                            "handshake",
                            self.config.handshake_timeout,
                            Status::Connecting,
                        )),
                    };
                }
            }
        }
    }

    fn cancelled(&self) -> ConnectionError {
        tracing::info!(connection = %self.id, "Connect attempt cancelled");
        self.reporter.error(
            ErrorKind::Cancelled,
            "connect attempt cancelled by disconnect",
            None,
            Status::Connecting,
        )
    }

    // ---- connected ----

    async fn session(&mut self, mut transport: Box<dyn Transport>) {
        let mut keepalive = tokio::time::interval_at(
            Instant::now() + self.config.keepalive_interval,
            self.config.keepalive_interval,
        );
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_inbound = Instant::now();
        let mut ping_seq: u64 = 0;

        let end = loop {
            let silence_deadline = last_inbound + self.config.keepalive_timeout;
            let outcome = tokio::select! {
                command = self.commands.recv() => self.on_session_command(&mut *transport, command).await,
                frame = transport.recv() => {
                    last_inbound = Instant::now();
                    self.on_frame(&mut *transport, frame).await
                }
                _ = keepalive.tick() => {
                    ping_seq += 1;
                    let token = format!("parley-{}", ping_seq);
                    tracing::trace!(connection = %self.id, %token, "Sending keep-alive ping");
                    transport
                        .send(Outbound::Ping(token))
                        .await
                        .err()
                        .map(|e| SessionEnd::Failed(self.reporter.from_transport(&e, Status::Connected)))
                }
                _ = tokio::time::sleep_until(silence_deadline) => Some(SessionEnd::Failed(self.reporter.timeout(
                    "keep-alive",
                    self.config.keepalive_timeout,
                    Status::Connected,
                ))),
            };
            if let Some(end) = outcome {
                break end;
            }
        };

        match end {
            SessionEnd::Requested => {
                self.will_disconnect();
                self.leave(&mut *transport).await;
            }
            SessionEnd::Failed(error) => {
                self.post_error(&error);
                self.will_disconnect();
            }
        }
        self.teardown(transport).await;
    }

    async fn on_session_command(
        &mut self,
        transport: &mut dyn Transport,
        command: Option<Command>,
    ) -> Option<SessionEnd> {
        match command {
            None => {
                tracing::debug!(connection = %self.id, "All handles dropped; disconnecting");
                Some(SessionEnd::Requested)
            }
            Some(Command::Disconnect { done }) => {
                self.park(done);
                Some(SessionEnd::Requested)
            }
            Some(Command::Connect) => {
                tracing::debug!(connection = %self.id, "Already connected; ignoring connect");
                None
            }
            Some(Command::Join { room, reply }) => {
                if self.tracker.contains(&room) {
                    let error = self.reporter.error(
                        ErrorKind::DuplicateRoom,
                        format!("room {} is already joined", room),
                        None,
                        Status::Connected,
                    );
                    self.post_error(&error);
                    let _ = reply.send(Err(error));
                    return None;
                }
                tracing::debug!(connection = %self.id, %room, "Requesting join");
                self.forward(transport, Outbound::Join(room), reply).await
            }
            Some(Command::Part { room, reply }) => {
                if !self.tracker.contains(&room) {
                    tracing::debug!(connection = %self.id, %room, "Not joined; part is a no-op");
                    let _ = reply.send(Ok(()));
                    return None;
                }
                tracing::debug!(connection = %self.id, %room, "Requesting part");
                self.forward(transport, Outbound::Part(room), reply).await
            }
        }
    }

    /// Send a membership request and answer the caller.
    async fn forward(
        &mut self,
        transport: &mut dyn Transport,
        frame: Outbound,
        reply: Reply,
    ) -> Option<SessionEnd> {
        match transport.send(frame).await {
            Ok(()) => {
                let _ = reply.send(Ok(()));
                None
            }
            Err(e) => {
                let error = self.reporter.from_transport(&e, Status::Connected);
                let _ = reply.send(Err(error.clone()));
                Some(SessionEnd::Failed(error))
            }
        }
    }

    async fn on_frame(
        &mut self,
        transport: &mut dyn Transport,
        frame: Result<Option<Inbound>, TransportError>,
    ) -> Option<SessionEnd> {
        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Some(SessionEnd::Failed(
                    self.reporter
                        .from_transport(&TransportError::Closed, Status::Connected),
                ));
            }
            Err(e) => {
                return Some(SessionEnd::Failed(
                    self.reporter.from_transport(&e, Status::Connected),
                ));
            }
        };

        match frame {
            Inbound::Joined {
                room,
                topic,
                members,
            } => {
                let room = ChatRoom::new(room, self.id, Timestamp::now())
                    .with_topic(topic)
                    .with_members(members);
                if let Err(e) = self.tracker.add_joined_room(Status::Connected, room) {
                    let error = self
                        .reporter
                        .error(e.kind(), e.to_string(), None, Status::Connected);
                    self.post_error(&error);
                }
                None
            }
            Inbound::Parted { room } => {
                self.remove_room(&room);
                None
            }
            Inbound::Kicked { room, reason } => {
                tracing::info!(
                    connection = %self.id,
                    %room,
                    reason = reason.as_deref().unwrap_or("-"),
                    "Kicked from room"
                );
                self.remove_room(&room);
                None
            }
            Inbound::Ping(token) => transport
                .send(Outbound::Pong(token))
                .await
                .err()
                .map(|e| SessionEnd::Failed(self.reporter.from_transport(&e, Status::Connected))),
            Inbound::Pong(token) => {
                tracing::trace!(connection = %self.id, %token, "Keep-alive answered");
                None
            }
            Inbound::Error { message } => Some(SessionEnd::Failed(self.reporter.error(
                ErrorKind::Protocol,
                "the server reported an error",
                Some(message),
                Status::Connected,
            ))),
            unexpected @ (Inbound::Welcome { .. } | Inbound::AuthFailed { .. }) => {
                Some(SessionEnd::Failed(self.reporter.error(
                    ErrorKind::Protocol,
                    "the server sent unexpected data",
                    Some(format!("{:?} after the handshake", unexpected)),
                    Status::Connected,
                )))
            }
        }
    }

    fn remove_room(&mut self, room: &RoomName) {
        if let Err(e) = self.tracker.remove_joined_room(Status::Connected, room) {
            // Frames are only handled while connected.
            tracing::warn!(connection = %self.id, %room, "Could not remove room: {}", e);
        }
    }

    // ---- disconnecting ----

    /// Graceful protocol-level quit, bounded by the leave timeout. Commands
    /// keep being answered meanwhile.
    async fn leave(&mut self, transport: &mut dyn Transport) {
        let graceful = tokio::time::timeout(self.config.leave_timeout, async {
            transport.send(Outbound::Quit(None)).await?;
            // Drain until the server closes the session.
            while transport.recv().await?.is_some() {}
            Ok::<(), TransportError>(())
        });
        tokio::pin!(graceful);

        let mut handles_open = true;
        let outcome = loop {
            tokio::select! {
                result = &mut graceful => break result,
                command = self.commands.recv(), if handles_open => match command {
                    Some(command) => self.refuse_while_disconnecting(command),
                    None => handles_open = false,
                },
            }
        };

        match outcome {
            Ok(Ok(())) | Ok(Err(TransportError::Closed)) => {
                tracing::debug!(connection = %self.id, "Server acknowledged quit")
            }
            Ok(Err(e)) => {
                let error = self.reporter.from_transport(&e, Status::Disconnecting);
                self.post_error(&error);
            }
            Err(_) => {
                let error = self.reporter.timeout(
                    "graceful leave",
                    self.config.leave_timeout,
                    Status::Disconnecting,
                );
                self.post_error(&error);
            }
        }
    }

    /// Close the transport, clear the roster, and land in `Disconnected`.
    async fn teardown(&mut self, mut transport: Box<dyn Transport>) {
        if let Err(e) = transport.close().await {
            tracing::debug!(connection = %self.id, "Transport close failed: {}", e);
        }
        drop(transport);

        // Anything queued so far was sent while still disconnecting.
        while let Ok(command) = self.commands.try_recv() {
            self.refuse_while_disconnecting(command);
        }

        // Rooms go first so no snapshot shows Disconnected with rooms left.
        let parted = self.tracker.clear_all();
        self.transition(Status::Disconnected);
        self.did_disconnect(parted);
        self.emit_status();
    }
}

/// Open a transport and authenticate. Returns the nickname the server
/// granted.
async fn establish(
    connector: Arc<dyn Connector>,
    config: ConnectionConfig,
) -> Result<(Box<dyn Transport>, String), TransportError> {
    let mut transport = connector.connect(&config.endpoint()).await?;
    transport
        .send(Outbound::Authenticate {
            nickname: config.credentials.nickname.clone(),
            password: config.credentials.password.clone(),
        })
        .await?;

    loop {
        match transport.recv().await? {
            Some(Inbound::Welcome { nickname }) => return Ok((transport, nickname)),
            Some(Inbound::AuthFailed { reason }) => {
                return Err(TransportError::AuthenticationRejected(reason));
            }
            Some(Inbound::Ping(token)) => transport.send(Outbound::Pong(token)).await?,
            Some(other) => {
                return Err(TransportError::Handshake(format!(
                    "unexpected {:?} before welcome",
                    other
                )));
            }
            None => return Err(TransportError::Closed),
        }
    }
}
