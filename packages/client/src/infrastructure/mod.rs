//! Infrastructure layer.
//!
//! Concrete implementations of the traits the domain layer defines: the
//! wire protocol, transports and repositories.

pub mod dto;
pub mod repository;
pub mod transport;
