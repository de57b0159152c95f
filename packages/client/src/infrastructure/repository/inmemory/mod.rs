//! In-memory repositories.

mod connection;

pub use connection::InMemoryConnectionRepository;
