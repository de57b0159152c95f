//! In-process transport over channels.
//!
//! [`loopback`] returns a connector for a [`ChatConnection`](crate::connection::ChatConnection)
//! and the server end that accepts its sessions. Each `connect` hands a
//! [`LoopbackPeer`] to the server, which scripts the remote side frame by
//! frame. Hosts that tunnel the protocol themselves can embed the client
//! the same way.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::{Connector, Endpoint, Inbound, Outbound, Transport, TransportError},
};

#[derive(Default)]
struct Shared {
    failures: Mutex<VecDeque<TransportError>>,
}

impl Shared {
    fn next_failure(&self) -> Option<TransportError> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Create a connected connector/server pair.
pub fn loopback() -> (LoopbackConnector, LoopbackServer) {
    let (peers_tx, peers_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        LoopbackConnector {
            peers: peers_tx,
            shared: Arc::clone(&shared),
        },
        LoopbackServer {
            peers: peers_rx,
            shared,
        },
    )
}

pub struct LoopbackConnector {
    peers: mpsc::UnboundedSender<LoopbackPeer>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError> {
        if let Some(failure) = self.shared.next_failure() {
            tracing::debug!(server = %endpoint.server, "Loopback connect failing as scripted");
            return Err(failure);
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let peer = LoopbackPeer {
            incoming: from_client,
            outgoing: to_client,
        };
        self.peers
            .send(peer)
            .map_err(|_| TransportError::Connect {
                addr: endpoint.authority(),
                reason: "loopback server is gone".to_string(),
            })?;
        tracing::debug!(server = %endpoint.server, "Loopback session opened");

        Ok(Box::new(LoopbackTransport {
            outgoing: Some(to_server),
            incoming: from_server,
        }))
    }
}

/// The accepting side of a loopback pair.
pub struct LoopbackServer {
    peers: mpsc::UnboundedReceiver<LoopbackPeer>,
    shared: Arc<Shared>,
}

impl LoopbackServer {
    /// Wait for the next session. `None` once the connector is dropped.
    pub async fn accept(&mut self) -> Option<LoopbackPeer> {
        self.peers.recv().await
    }

    /// Take a session that is already waiting, if any.
    pub fn try_accept(&mut self) -> Option<LoopbackPeer> {
        self.peers.try_recv().ok()
    }

    /// Make the next `connect` fail with `error` before any session opens.
    pub fn fail_next_connect(&self, error: TransportError) {
        self.shared
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }
}

/// Server end of one loopback session.
pub struct LoopbackPeer {
    incoming: mpsc::UnboundedReceiver<Outbound>,
    outgoing: mpsc::UnboundedSender<Result<Inbound, TransportError>>,
}

impl LoopbackPeer {
    /// Next frame from the client. `None` once the client closed.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.incoming.recv().await
    }

    pub fn send(&self, frame: Inbound) {
        let _ = self.outgoing.send(Ok(frame));
    }

    /// Make the client's next read fail.
    pub fn fail(&self, error: TransportError) {
        let _ = self.outgoing.send(Err(error));
    }

    /// Close the session from the server side.
    pub fn close(self) {
        drop(self);
    }

    /// Expect `authenticate` and answer with `welcome`.
    pub async fn accept_login(&mut self) {
        match self.recv().await {
            Some(Outbound::Authenticate { nickname, .. }) => self.send(Inbound::Welcome {
                nickname: nickname.as_str().to_string(),
            }),
            other => tracing::warn!("Loopback peer expected authenticate, got {:?}", other),
        }
    }
}

struct LoopbackTransport {
    outgoing: Option<mpsc::UnboundedSender<Outbound>>,
    incoming: mpsc::UnboundedReceiver<Result<Inbound, TransportError>>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, frame: Outbound) -> Result<(), TransportError> {
        let outgoing = self.outgoing.as_ref().ok_or(TransportError::Closed)?;
        outgoing.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Option<Inbound>, TransportError> {
        match self.incoming.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.outgoing = None;
        self.incoming.close();
        Ok(())
    }
}
