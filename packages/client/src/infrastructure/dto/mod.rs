//! Data transfer objects for the wire protocol.

pub mod wire;

pub use wire::{ClientFrame, ServerFrame};
