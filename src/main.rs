//! marketsnap - rate-limited marketplace snapshot fetcher.
//!
//! Polls the Skinport API for item listings or sales history and stores each
//! response as a timestamped JSON file.

use std::process::ExitCode;

use marketsnap::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "marketsnap=debug"
    } else {
        "marketsnap=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = cli::run().await;
    if let Err(e) = &result {
        cli::report_error(e);
    }
    ExitCode::from(cli::exit_code(&result))
}
