//! The Dataform trigger service.

mod app;
mod config;
mod dataform;
mod error;
mod event;
#[cfg(test)]
mod fixtures;
mod names;
mod pipeline;
mod server;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing/logging system.
    tracing_subscriber::registry()
        // Filter spans based on the RUST_LOG env var.
        .with(tracing_subscriber::EnvFilter::from_default_env())
        // Send a copy of all spans to stdout in compact form.
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
        )
        // Install this registry as the global tracing registry.
        .try_init()
        .context("error initializing logging/tracing system")?;

    let cfg = Arc::new(Config::new()?);
    tracing::info!(
        http_port = %cfg.http_port,
        repository = %cfg.repository(),
        workspace = %cfg.workspace,
        "starting Dataform trigger service",
    );
    if let Err(err) = App::new(cfg).spawn().await.context("error joining app handle").and_then(|res| res) {
        tracing::error!(error = ?err);
    }

    // Ensure any pending output is flushed.
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    Ok(())
}
