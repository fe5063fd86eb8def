//! # Orrery
//!
//! The command-line binary for the Orrery graph store.
//!
//! ## Usage
//!
//! ```bash
//! # Counters and options
//! orrery stats graph.json
//!
//! # Neighbourhood queries
//! orrery neighbors graph.json alice --relation out
//! orrery edges graph.orry --node alice --target bob
//!
//! # Maintenance
//! orrery check graph.orry
//! orrery convert graph.json graph.orry --format binary
//! orrery merge a.json b.orry --output merged.json
//! ```

use clap::Parser;
use orrery::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // ORRERY_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ORRERY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "orrery=debug,orrery_core=debug"
    } else if cli.quiet {
        "orrery=error,orrery_core=error"
    } else {
        "orrery=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
