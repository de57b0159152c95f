//! Terminal chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley -- --nick alice --join '#lounge'
//! ```

use clap::Parser;
use parley_client::ui::Args;
use parley_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Run the client
    if let Err(e) = parley_client::run_client(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
