//! ==============================================================================
//! main.rs - snapshot dashboard entry point
//! ==============================================================================
//!
//! purpose:
//!     serves a single-page monitoring dashboard built from a csv snapshot.
//!     the first row of the file is the "latest reading"; it is shown as
//!     metric cards, a gauge and charts, next to a sidebar of controls
//!     whose state is displayed but never acted on.
//!
//! responsibilities:
//!     - load configuration (config/dashboard.toml or defaults)
//!     - initialize logging
//!     - serve the dashboard; every request is a fresh render pass
//!
//! relationships:
//!     - config.rs  (listen address, data path, log level)
//!     - source.rs  (csv -> Table -> Reading)
//!     - series.rs  (minute-spaced series for the over-time charts)
//!     - layout.rs  (reading + controls -> Page)
//!     - render.rs  (Page -> html with inline svg)
//!     - server.rs  (axum routes)
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                     rust host (this file)                 │
//!     │                                                          │
//!     │   request ─► server ─► source ─► layout ─► render ─► html │
//!     │                 │                   │                    │
//!     │                 │                   └──────────► json    │
//!     │                 └── DataLoadError ─► 500, no dashboard    │
//!     └──────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

mod config;
mod domain;
mod layout;
mod render;
mod series;
mod server;
mod source;

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration (logged through a bootstrap subscriber,
    // the configured level is not known yet)
    let config = tracing::subscriber::with_default(
        tracing_subscriber::fmt().finish(),
        config::DashboardConfig::load_or_default,
    );

    // step 2: logging, RUST_LOG wins over the config level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.print_summary();

    // step 3: serve until the process is stopped
    server::run_server(Arc::new(config)).await
}
