//! Deutsch Syntax · German exercise backend
//!
//! - Axum HTTP + WebSocket API over per-profile exercise sessions
//! - Sentence analysis and feedback for German answers
//! - Local JSON buckets per profile, optional remote submission store
//! - Static fallback (./static/index.html) for the page renderer
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   CONFIG_PATH          : path to TOML config (storage, remote, curriculum overrides)
//!   DATA_DIR             : directory for local buckets (default "./data")
//!   SUBMISSIONS_URL      : base URL of the submissions REST endpoint
//!   SUBMISSIONS_API_KEY  : API key for it; remote saves are enabled only when both are set
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod lexicon;
mod analyzer;
mod feedback;
mod identity;
mod error;
mod store;
mod remote;
mod curriculum;
mod progress;
mod session;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config, curriculum and the optional remote client.
  let state = Arc::new(AppState::from_env());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "deutsch_syntax", %addr, remote = state.remote.is_some(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
