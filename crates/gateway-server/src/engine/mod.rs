//! Workflow engine boundary
//!
//! The gateway only needs two remote operations from the batch-workflow
//! engine: submit a named run, and read a run's current status. They sit
//! behind [`WorkflowEngine`] so the orchestrators can be driven by any
//! implementation; [`AirflowClient`] is the production one.

use async_trait::async_trait;
use gateway_common::RunId;

pub mod airflow;
pub mod error;
pub mod types;

pub use airflow::AirflowClient;
pub use error::EngineError;
pub use types::{DagRunAck, RunStatusSnapshot, SubmissionRequest};

/// Remote operations of the external workflow engine
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Submit a new run of `workflow` described by `request`.
    async fn submit_run(
        &self,
        workflow: &str,
        request: &SubmissionRequest,
    ) -> Result<DagRunAck, EngineError>;

    /// Fetch the current status of `run_id` within `workflow`.
    async fn get_run_status(
        &self,
        workflow: &str,
        run_id: &RunId,
    ) -> Result<RunStatusSnapshot, EngineError>;
}
