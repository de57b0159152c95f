//! Interactive prompt.
//!
//! rustyline blocks, so it runs on its own thread and forwards lines to
//! the async side over a channel.

use rustyline::{DefaultEditor, error::ReadlineError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{RoomName, ValueObjectError};

pub const HELP: &str = "\
/connect          connect (or reconnect) to the server
/disconnect       leave the server gracefully
/join <room>      join a room
/part <room>      leave a room
/rooms            list joined rooms
/status           show the connection status
/help             show this list
/quit             disconnect and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Connect,
    Disconnect,
    Join(RoomName),
    Part(RoomName),
    Rooms,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("commands start with '/', try /help")]
    NotACommand,

    #[error("unknown command /{0}, try /help")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid room name: {0}")]
    InvalidRoom(ValueObjectError),
}

/// Parse one prompt line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let rest = line.strip_prefix('/').ok_or(ParseError::NotACommand)?;
    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default().to_lowercase();
    let argument = words.next();
    let extra = words.next();

    let room = |usage: &'static str| match (argument, extra) {
        (Some(room), None) => RoomName::new(room.to_string()).map_err(ParseError::InvalidRoom),
        _ => Err(ParseError::Usage(usage)),
    };

    let command = match name.as_str() {
        "connect" => ReplCommand::Connect,
        "disconnect" => ReplCommand::Disconnect,
        "join" | "j" => ReplCommand::Join(room("/join <room>")?),
        "part" | "leave" => ReplCommand::Part(room("/part <room>")?),
        "rooms" => ReplCommand::Rooms,
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        _ => return Err(ParseError::Unknown(name)),
    };
    Ok(Some(command))
}

/// Read lines on a dedicated thread. The channel closes on EOF or Ctrl-C.
pub fn spawn_prompt(prompt: &str) -> Result<mpsc::UnboundedReceiver<String>, ReadlineError> {
    let prompt = prompt.to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => {
                let _ = ready_tx.send(Ok(()));
                editor
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        loop {
            match editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::warn!("Prompt failed: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("Prompt thread finished");
    });

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(rx),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ReadlineError::Eof),
    }
}
