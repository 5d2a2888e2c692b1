//! Request relay service.
//!
//! Executes HTTP requests described as JSON on behalf of its clients and
//! keeps a bounded, most-recent-first history of the exchanges.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 REQUEST RELAY                 │
//!                    │                                               │
//!  POST /proxy/send  │  ┌──────────┐    ┌──────────┐                 │
//!  ──────────────────┼─▶│   http   │───▶│  relay   │─────────────────┼──▶ Target
//!                    │  │  server  │    │ (reqwest)│◀────────────────┼─── Server
//!  ◀─────────────────┼──│          │◀───│ envelope │                 │
//!   ResponseEnvelope │  │          │    └──────────┘                 │
//!                    │  │          │    ┌──────────┐                 │
//!  /history[/{id}]   │  │          │───▶│ history  │ (≤100, newest   │
//!  ──────────────────┼─▶│          │◀───│  store   │  first)         │
//!                    │  └──────────┘    └──────────┘                 │
//!                    │                                               │
//!                    │  config · observability · lifecycle           │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use request_relay::config::{self, ServiceConfig};
use request_relay::lifecycle;
use request_relay::observability::logging;

#[derive(Parser)]
#[command(name = "request-relay")]
#[command(about = "HTTP request relay with bounded request history", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "request-relay starting");

    lifecycle::run(config).await?;
    Ok(())
}
