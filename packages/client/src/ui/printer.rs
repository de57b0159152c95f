//! Prints connection events to the terminal.

use parley_shared::time::{now_millis, timestamp_to_local_clock};

use crate::domain::{ChatRoom, ConnectionEvent, ConnectionObserver};

/// Observer that writes one line per event to stdout.
#[derive(Debug, Default)]
pub struct EventPrinter;

impl EventPrinter {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, line: String) {
        println!("[{}] {}", timestamp_to_local_clock(now_millis()), line);
    }
}

impl ConnectionObserver for EventPrinter {
    fn on_event(&self, event: &ConnectionEvent) {
        self.print(format_event(event));
    }
}

/// Render an event as a single line.
pub fn format_event(event: &ConnectionEvent) -> String {
    match event {
        ConnectionEvent::StatusChanged(status) => format!("* {}", status),
        ConnectionEvent::Error(error) => match error.cause() {
            Some(cause) => format!("! {} ({})", error, cause),
            None => format!("! {}", error),
        },
        ConnectionEvent::RoomJoined(room) => {
            let mut line = format!("→ joined {} ({} members)", room.name, room.members.len());
            if let Some(topic) = &room.topic {
                line.push_str(&format!(": {}", topic));
            }
            line
        }
        ConnectionEvent::RoomParted(room) => format!("← left {}", room.name),
    }
}

/// Render the roster for `/rooms`.
pub fn format_rooms(rooms: &[ChatRoom]) -> String {
    if rooms.is_empty() {
        return "no rooms joined".to_string();
    }
    rooms
        .iter()
        .map(|room| match &room.topic {
            Some(topic) => format!("{} ({} members) {}", room.name, room.members.len(), topic),
            None => format!("{} ({} members)", room.name, room.members.len()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
