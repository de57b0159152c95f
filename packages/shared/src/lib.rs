//! Shared utilities for Parley.
//!
//! Logger initialisation and timestamp helpers used by every package.

pub mod logger;
pub mod time;
