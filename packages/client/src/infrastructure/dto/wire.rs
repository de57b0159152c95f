//! JSON frames exchanged with the chat server over WebSocket.
//!
//! Every frame is a JSON object tagged by a kebab-case `type` field:
//!
//! ```json
//! {"type":"join","room":"#lounge"}
//! {"type":"joined","room":"#lounge","topic":"welcome","members":["alice","bob"]}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{Inbound, Outbound, RoomName, TransportError};

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Authenticate {
        nickname: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    Join {
        room: String,
    },
    Part {
        room: String,
    },
    Ping {
        token: String,
    },
    Pong {
        token: String,
    },
    Quit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    Welcome {
        nickname: String,
    },
    AuthFailed {
        reason: String,
    },
    Joined {
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(default)]
        members: Vec<String>,
    },
    Parted {
        room: String,
    },
    Kicked {
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Ping {
        token: String,
    },
    Pong {
        token: String,
    },
    Error {
        message: String,
    },
}

impl ClientFrame {
    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl ServerFrame {
    pub fn from_json(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl From<Outbound> for ClientFrame {
    fn from(frame: Outbound) -> Self {
        match frame {
            Outbound::Authenticate { nickname, password } => ClientFrame::Authenticate {
                nickname: nickname.as_str().to_string(),
                password,
            },
            Outbound::Join(room) => ClientFrame::Join {
                room: room.into_string(),
            },
            Outbound::Part(room) => ClientFrame::Part {
                room: room.into_string(),
            },
            Outbound::Ping(token) => ClientFrame::Ping { token },
            Outbound::Pong(token) => ClientFrame::Pong { token },
            Outbound::Quit(reason) => ClientFrame::Quit { reason },
        }
    }
}

fn room_name(room: String) -> Result<RoomName, TransportError> {
    RoomName::new(room).map_err(|e| TransportError::Malformed(e.to_string()))
}

impl TryFrom<ServerFrame> for Inbound {
    type Error = TransportError;

    fn try_from(frame: ServerFrame) -> Result<Self, TransportError> {
        let inbound = match frame {
            ServerFrame::Welcome { nickname } => Inbound::Welcome { nickname },
            ServerFrame::AuthFailed { reason } => Inbound::AuthFailed { reason },
            ServerFrame::Joined {
                room,
                topic,
                members,
            } => Inbound::Joined {
                room: room_name(room)?,
                topic,
                members,
            },
            ServerFrame::Parted { room } => Inbound::Parted {
                room: room_name(room)?,
            },
            ServerFrame::Kicked { room, reason } => Inbound::Kicked {
                room: room_name(room)?,
                reason,
            },
            ServerFrame::Ping { token } => Inbound::Ping(token),
            ServerFrame::Pong { token } => Inbound::Pong(token),
            ServerFrame::Error { message } => Inbound::Error { message },
        };
        Ok(inbound)
    }
}
