//! Command-line front end.

pub mod cli;
pub mod printer;
pub mod repl;
mod runner;

pub use cli::Args;
pub use printer::EventPrinter;
pub use runner::{ClientError, run};
