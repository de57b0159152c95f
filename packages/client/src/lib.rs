//! Parley chat client.
//!
//! - `domain`: value objects, entities, events and the traits at the seams
//! - `connection`: the per-connection state machine and its collaborators
//! - `infrastructure`: wire format, transports and the connection registry
//! - `usecase`: application operations over the registry
//! - `ui`: the `parley` command-line front end

pub mod connection;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use connection::{ChatConnection, ConnectionConfig};
pub use ui::run as run_client;
