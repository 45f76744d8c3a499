//! Shared-link redirector server
//!
//! # Usage
//!
//! ```bash
//! redirector-server [--config redirector.toml] [--listen 0.0.0.0:8080] [--once]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Control log verbosity (default: `redirector_server=info,redirector_core=info`)
//! - `REDIRECTOR_ACCESS_TOKEN`: Remote API bearer token
//! - `REDIRECTOR_WEBHOOK_PRIMARY_KEY` / `REDIRECTOR_WEBHOOK_SECONDARY_KEY`: signing keys
//!
//! Logs go to stderr; `--once` prints the sweep report on stdout.

use std::time::Duration;

use clap::Parser;
use redirector_server::cli::Args;
use redirector_server::{AppState, serve};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redirector_server=info".parse()?)
                .add_directive("redirector_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    tracing::info!(config = ?args.config, "Starting redirector-server");

    // Built before the runtime starts; the blocking HTTP client must not be
    // created or dropped inside it
    let state = AppState::from_config(&config)?;

    if args.once {
        let report = state.run_sweep()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let sweep_every = config
        .server
        .sweep_interval_secs
        .map(|secs| Duration::from_secs(secs.max(1)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(state.clone(), &config.server.listen, sweep_every))?;
    drop(runtime);

    Ok(())
}
