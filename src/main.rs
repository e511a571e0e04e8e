//! PgBouncer configuration API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ basic auth ──▶ update handler
//!                                                        │
//!                                                        ▼ UpdateJob
//!                                                  ┌──────────────┐
//!                                                  │ UpdateWorker │ one job at a time
//!                                                  └──────┬───────┘
//!                                   read / merge / rename │
//!                                                         ▼
//!                                                  pgbouncer.ini
//!                                                         │
//!                                                         ▼
//!                                           ReloadController (psql "RELOAD")
//!     Client Response                                     │
//!     ◀─────────────── status string / error ◀────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use pgbouncer_conf_api::config::load_startup_config;
use pgbouncer_conf_api::lifecycle::startup;

#[derive(Parser)]
#[command(name = "pgbouncer-conf-api")]
#[command(about = "HTTP API that edits pgbouncer.ini and reloads PgBouncer", long_about = None)]
struct Args {
    /// Optional TOML settings file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_startup_config(args.config.as_deref())?;
    startup::run(config).await
}
