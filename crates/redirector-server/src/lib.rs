//! HTTP service for the shared-link redirector
//!
//! Wraps the reconciliation engine from `redirector-core` in an `axum`
//! router:
//!
//! ```text
//! [ Box webhooks ]   [ operators ]   [ downloaders ]
//!        |                 |                |
//!   POST /webhook      POST /sync     GET /files/{path}
//!        \                 |                /
//!         +------- redirector-server ------+
//!                          |
//!              (spawn_blocking, Rust API)
//!                          |
//!                  redirector-core
//!                    /           \
//!           BoxClient         FileManifestStore
//! ```
//!
//! Engine calls block, so every route hands them to the blocking pool.

pub mod cli;
pub mod error;
pub mod routes;
pub mod state;
pub mod sweep;

use std::time::Duration;

use tokio::net::TcpListener;

pub use error::{Error, Result};
pub use routes::{PRIMARY_SIGNATURE_HEADER, SECONDARY_SIGNATURE_HEADER, router};
pub use state::AppState;
pub use sweep::spawn_scheduled_sweeps;

/// Serve until Ctrl-C
pub async fn serve(state: AppState, listen: &str, sweep_every: Option<Duration>) -> Result<()> {
    if let Some(every) = sweep_every {
        tracing::info!(every_secs = every.as_secs(), "Scheduling full sweeps");
        spawn_scheduled_sweeps(state.clone(), every);
    }

    let listener = TcpListener::bind(listen).await?;
    tracing::info!(listen = %listener.local_addr()?, root_id = state.root_id(), "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
