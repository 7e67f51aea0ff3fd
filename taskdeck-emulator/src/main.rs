//! Taskdeck service emulator — local stand-in for the managed backend.
//!
//! An axum WebSocket server implementing the Taskdeck service boundary:
//! account registry, schemaless document collections, and live query
//! subscriptions that push full snapshots on every change.
//!
//! # Usage
//!
//! ```bash
//! # Run on the default address 127.0.0.1:9400
//! cargo run --bin taskdeck-emulator
//!
//! # Run on a custom address
//! cargo run --bin taskdeck-emulator -- --bind 127.0.0.1:7000
//!
//! # Or via environment variable
//! TASKDECK_EMULATOR_ADDR=127.0.0.1:7000 cargo run --bin taskdeck-emulator
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdeck_emulator::config::{EmulatorCliArgs, EmulatorConfig};
use taskdeck_emulator::server::{self, EmulatorState};

#[tokio::main]
async fn main() {
    let cli = EmulatorCliArgs::parse();

    let config = match EmulatorConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskdeck emulator");

    let state = Arc::new(EmulatorState::from_config(&config));

    match server::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "emulator listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "emulator server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start emulator");
            std::process::exit(1);
        }
    }
}
