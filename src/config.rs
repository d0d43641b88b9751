//! Runtime configuration.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The server's logging config, which uses Rust's `env_logger` directives.
    pub rust_log: String,
    /// The port on which Pub/Sub push deliveries are received.
    pub http_port: u16,

    /// The GCP project which hosts the Dataform repository.
    pub project: String,
    /// The location of the Dataform repository.
    pub location: String,
    /// The name of the Dataform repository.
    pub repo: String,
    /// The Dataform workspace from which compilation results are created.
    pub workspace: String,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this routine just parses the runtime environment and builds the application
    /// config from that. In the future, this may take into account an optional config file as
    /// well.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        envy::from_env().context("error building config from env")
    }

    /// The resource path of the configured Dataform repository.
    ///
    /// All compilation results and workflow invocations are created under this parent.
    pub fn repository(&self) -> String {
        format!("projects/{}/locations/{}/repositories/{}", self.project, self.location, self.repo)
    }

    /// The resource path of the configured Dataform workspace.
    pub fn workspace_path(&self) -> String {
        format!("{}/workspaces/{}", self.repository(), self.workspace)
    }

    /// Create a new config instance for testing.
    #[cfg(test)]
    pub fn new_test() -> Self {
        Self {
            rust_log: "error".into(),
            http_port: 7000,
            project: "my-project".into(),
            location: "europe-west1".into(),
            repo: "analytics".into(),
            workspace: "prod".into(),
        }
    }
}
