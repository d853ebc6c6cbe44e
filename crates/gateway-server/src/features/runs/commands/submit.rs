//! Submit a batch of uploads as a new workflow run
//!
//! `START -> FOLDER_CREATED -> FILES_STAGED -> SUBMITTED | ABORTED`
//!
//! The run folder outlives this call only if the engine accepted the run.
//! Once it has, the engine owns the folder and nothing here touches it again.

use gateway_common::{PeriodMetadata, RunId};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::engine::{DagRunAck, EngineError, SubmissionRequest};
use crate::features::runs::types::{SubmissionStatus, SubmitRunResponse, Workflow};
use crate::features::runs::RunsState;
use crate::staging::{self, RunFolderGuard, StagingError, Upload};

/// Validated submission input
#[derive(Debug, Clone)]
pub struct SubmitRunCommand {
    pub workflow: Workflow,
    pub period: PeriodMetadata,
    pub notify_email: String,
    pub uploads: Vec<Upload>,
}

#[derive(Debug, Error)]
pub enum SubmitRunError {
    #[error("Failed to stage run inputs: {0}")]
    Storage(#[from] StagingError),

    #[error("Failed to trigger workflow {dag_id}: {}", .source.detail())]
    Engine {
        dag_id: &'static str,
        #[source]
        source: EngineError,
    },
}

#[instrument(skip(state, command), fields(dag_id = %command.workflow, files = command.uploads.len()))]
pub async fn handle(
    state: &RunsState,
    command: SubmitRunCommand,
) -> Result<SubmitRunResponse, SubmitRunError> {
    let run_id = staging::create_run_id();

    // Nothing exists yet if this fails, so there is nothing to clean up.
    let folder = state.staging.ensure_run_folder(&run_id).await?;

    // Removes the folder if this future is dropped before the engine answers.
    let guard = RunFolderGuard::arm(folder.clone());

    match stage_and_submit(state, &command, &run_id, &folder).await {
        Ok((files, ack)) => {
            guard.disarm();
            info!(
                run_id = %run_id,
                engine_state = ?ack.state,
                "Workflow run submitted"
            );

            Ok(SubmitRunResponse {
                run_id: run_id.clone(),
                dag_run_id: run_id,
                status: SubmissionStatus::Submitted,
                files,
            })
        },
        Err(e) => {
            error!(run_id = %run_id, error = %e, "Submission aborted");
            state.staging.cleanup_run_folder(&folder).await;
            guard.disarm();
            Err(e)
        },
    }
}

async fn stage_and_submit(
    state: &RunsState,
    command: &SubmitRunCommand,
    run_id: &RunId,
    folder: &Path,
) -> Result<(Vec<String>, DagRunAck), SubmitRunError> {
    let files = state
        .staging
        .persist_uploads(folder, &command.uploads)
        .await?;

    let request = SubmissionRequest::new(
        run_id.clone(),
        command.period,
        &command.notify_email,
        staging::input_subdir(run_id),
    );

    let dag_id = command.workflow.dag_id();
    let ack = state
        .engine
        .submit_run(dag_id, &request)
        .await
        .map_err(|source| SubmitRunError::Engine { dag_id, source })?;

    Ok((files, ack))
}
