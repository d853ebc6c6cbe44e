//! Workflow runs: submission and status polling
//!
//! - `commands/submit` stages uploads in a fresh run folder and triggers the
//!   engine, removing the folder again if the engine never accepted the run.
//! - `queries/poll` waits for a run to reach a terminal state and reports the
//!   output files the engine left behind.

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

use std::sync::Arc;

use crate::config::{Config, PollingConfig};
use crate::engine::{AirflowClient, WorkflowEngine};
use crate::error::ServerResult;
use crate::staging::RunStaging;

pub use commands::{SubmitRunCommand, SubmitRunError};
pub use queries::{PollRunError, PollRunQuery};
pub use routes::runs_routes;
pub use types::{PollOutcome, SubmitRunResponse, Workflow};

/// Dependencies shared by the run handlers
///
/// Built once at startup; cloning only bumps reference counts.
#[derive(Clone)]
pub struct RunsState {
    pub staging: RunStaging,
    pub engine: Arc<dyn WorkflowEngine>,
    pub polling: PollingConfig,
}

impl RunsState {
    /// Build the production state: the shared root is created if missing and
    /// a single pooled engine client is shared by every request.
    pub async fn from_config(config: &Config) -> ServerResult<Self> {
        let staging = RunStaging::new(&config.staging.shared_root)?;
        staging.ensure_root().await?;
        tracing::info!(root = %staging.root().display(), "Shared input folder ready");

        let engine = AirflowClient::new(&config.engine)?;
        tracing::info!(base_url = %engine.base_url(), "Workflow engine client initialized");

        Ok(Self {
            staging,
            engine: Arc::new(engine),
            polling: config.polling,
        })
    }
}
