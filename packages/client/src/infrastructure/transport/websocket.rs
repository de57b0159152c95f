//! WebSocket transport: JSON text frames over `ws://` or `wss://`.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, client_async_tls,
    tungstenite::{self, Message},
};

use crate::{
    domain::{
        Connector, Endpoint, Inbound, Outbound, Transport, TransportError, TransportSecurity,
    },
    infrastructure::dto::{ClientFrame, ServerFrame},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket sessions to `endpoint.url()`.
///
/// Resolution runs before the TCP connect so that a bad host name is told
/// apart from an unreachable server.
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

fn install_crypto_provider() {
    // Fails only if a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError> {
        let host = endpoint.server.as_str();
        let addrs: Vec<_> = tokio::net::lookup_host((host, endpoint.port))
            .await
            .map_err(|e| TransportError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                host: host.to_string(),
                reason: "no addresses found".to_string(),
            });
        }
        tracing::debug!(host, addrs = ?addrs, "Resolved server address");

        let mut last_error = None;
        let mut tcp = None;
        for addr in &addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%addr, "TCP connect failed: {}", e);
                    last_error = Some(TransportError::Connect {
                        addr: addr.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        let tcp = match tcp {
            Some(stream) => stream,
            None => {
                return Err(last_error.unwrap_or_else(|| TransportError::Connect {
                    addr: endpoint.authority(),
                    reason: "no address could be reached".to_string(),
                }));
            }
        };
        if let Err(e) = tcp.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", e);
        }

        if endpoint.security == TransportSecurity::Tls {
            install_crypto_provider();
        }
        let url = endpoint.url();
        let (stream, response) = client_async_tls(url.as_str(), tcp)
            .await
            .map_err(handshake_error)?;
        tracing::debug!(%url, status = %response.status(), "WebSocket session established");

        Ok(Box::new(WebSocketTransport { stream }))
    }
}

fn handshake_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::Tls(e) => TransportError::Tls(e.to_string()),
        tungstenite::Error::Io(e) => TransportError::Io(e.to_string()),
        tungstenite::Error::Http(response) => {
            TransportError::Handshake(format!("server answered {}", response.status()))
        }
        other => TransportError::Handshake(other.to_string()),
    }
}

fn session_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        }
        tungstenite::Error::Io(e) => TransportError::Io(e.to_string()),
        tungstenite::Error::Tls(e) => TransportError::Tls(e.to_string()),
        other => TransportError::Io(other.to_string()),
    }
}

/// An open WebSocket session.
pub struct WebSocketTransport {
    stream: WsStream,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: Outbound) -> Result<(), TransportError> {
        let json = ClientFrame::from(frame).to_json()?;
        tracing::trace!(frame = %json, "Sending frame");
        self.stream
            .send(Message::Text(json.into()))
            .await
            .map_err(session_error)
    }

    async fn recv(&mut self) -> Result<Option<Inbound>, TransportError> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(tungstenite::Error::ConnectionClosed)) | None => return Ok(None),
                Some(Err(e)) => return Err(session_error(e)),
            };
            match message {
                Message::Text(text) => {
                    tracing::trace!(frame = %text.as_str(), "Received frame");
                    let frame = ServerFrame::from_json(text.as_str())?;
                    return Inbound::try_from(frame).map(Some);
                }
                Message::Close(frame) => {
                    tracing::debug!(close = ?frame, "Server closed the session");
                    return Ok(None);
                }
                Message::Binary(_) => {
                    return Err(TransportError::Malformed(
                        "binary frames are not part of the protocol".to_string(),
                    ));
                }
                // Control frames are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(session_error(e)),
        }
    }
}
