//! Test fixtures: an in-process chat server speaking the JSON protocol.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use parley_client::{
    ConnectionConfig,
    domain::{ConnectionEvent, ConnectionObserver, Credentials, Nickname, ServerAddress},
};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// How the test server answers.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Reject `authenticate` unless it carries this password.
    pub password: Option<String>,
    /// Never answer `authenticate`.
    pub silent: bool,
    /// Topic reported for every joined room.
    pub topic: Option<String>,
}

pub struct TestServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral local port.
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, behavior.clone(), Arc::clone(&log)));
            }
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Client configuration pointing at this server.
    pub fn config(&self, nickname: &str) -> ConnectionConfig {
        ConnectionConfig::new(
            ServerAddress::new("127.0.0.1".to_string()).unwrap(),
            Credentials::new(Nickname::new(nickname.to_string()).unwrap()),
        )
        .with_port(self.port())
    }

    /// Every frame received from clients so far, in order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Types of the received frames.
    pub fn received_types(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|frame| frame["type"].as_str().map(str::to_string))
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(stream: TcpStream, behavior: Behavior, received: Arc<Mutex<Vec<Value>>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    let mut nickname = String::new();

    while let Some(Ok(message)) = ws.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        received.lock().unwrap().push(frame.clone());

        let reply = match frame["type"].as_str() {
            Some("authenticate") if behavior.silent => None,
            Some("authenticate") => {
                let password = frame["password"].as_str();
                match &behavior.password {
                    Some(expected) if password != Some(expected.as_str()) => {
                        Some(json!({"type": "auth-failed", "reason": "invalid password"}))
                    }
                    _ => {
                        nickname = frame["nickname"].as_str().unwrap_or_default().to_string();
                        Some(json!({"type": "welcome", "nickname": nickname}))
                    }
                }
            }
            Some("join") => Some(json!({
                "type": "joined",
                "room": frame["room"],
                "topic": behavior.topic,
                "members": [nickname],
            })),
            Some("part") => Some(json!({"type": "parted", "room": frame["room"]})),
            Some("ping") => Some(json!({"type": "pong", "token": frame["token"]})),
            Some("pong") => None,
            Some("quit") => {
                let _ = ws.close(None).await;
                break;
            }
            _ => Some(json!({"type": "error", "message": "unknown frame"})),
        };

        if let Some(reply) = reply {
            if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    }
}

/// Observer forwarding every event to a channel.
pub struct EventLog(mpsc::UnboundedSender<ConnectionEvent>);

impl EventLog {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self(tx)), rx)
    }
}

impl ConnectionObserver for EventLog {
    fn on_event(&self, event: &ConnectionEvent) {
        let _ = self.0.send(event.clone());
    }
}

/// Next event, failing the test after a few seconds.
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<ConnectionEvent>) -> ConnectionEvent {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("Timed out waiting for an event")
        .expect("Event channel closed")
}
