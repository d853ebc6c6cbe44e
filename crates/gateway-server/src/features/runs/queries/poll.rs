//! Wait for a workflow run to finish
//!
//! The engine is asked for the run status up to `max_attempts` times with
//! `interval` between calls. There is no wait after a terminal observation and
//! none after the last attempt, so an exhausted poll costs `max_attempts - 1`
//! intervals.

use chrono::{DateTime, NaiveDateTime, Utc};
use gateway_common::{RunId, RunState};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::engine::{EngineError, RunStatusSnapshot};
use crate::features::runs::types::{PollOutcome, Workflow};
use crate::features::runs::RunsState;
use crate::staging::StagingError;

/// Offset-less timestamps the engine may report; read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone)]
pub struct PollRunQuery {
    pub workflow: Workflow,
    pub run_id: RunId,
}

#[derive(Debug, Error)]
pub enum PollRunError {
    #[error("Failed to get status of run {run_id} in workflow {dag_id}: {}", .source.detail())]
    Engine {
        dag_id: &'static str,
        run_id: RunId,
        #[source]
        source: EngineError,
    },

    #[error("Engine returned an unusable status for run {run_id}: {reason}")]
    MalformedResponse { run_id: RunId, reason: String },

    #[error("Failed to read run outputs: {0}")]
    Storage(#[from] StagingError),
}

#[instrument(skip(state, query), fields(dag_id = %query.workflow, run_id = %query.run_id))]
pub async fn handle(state: &RunsState, query: PollRunQuery) -> Result<PollOutcome, PollRunError> {
    let dag_id = query.workflow.dag_id();
    let max_attempts = state.polling.max_attempts;

    for attempt in 1..=max_attempts {
        let snapshot = state
            .engine
            .get_run_status(dag_id, &query.run_id)
            .await
            .map_err(|source| PollRunError::Engine {
                dag_id,
                run_id: query.run_id.clone(),
                source,
            })?;

        if let Some(terminal) = RunState::terminal(&snapshot.state) {
            info!(attempt, state = %terminal, "Run reached terminal state");
            return finish(state, query.run_id, terminal, snapshot).await;
        }

        debug!(attempt, max_attempts, state = %snapshot.state, "Run not finished");

        if attempt < max_attempts {
            tokio::time::sleep(state.polling.interval()).await;
        }
    }

    warn!(max_attempts, "Poll budget exhausted before the run finished");
    Ok(PollOutcome::budget_exhausted(query.run_id))
}

async fn finish(
    state: &RunsState,
    run_id: RunId,
    terminal: RunState,
    snapshot: RunStatusSnapshot,
) -> Result<PollOutcome, PollRunError> {
    let completed_at = parse_completed_at(snapshot.end_date.as_ref()).map_err(|reason| {
        PollRunError::MalformedResponse {
            run_id: run_id.clone(),
            reason,
        }
    })?;

    let folder = state.staging.run_folder(&run_id);
    let outputs: Vec<String> = state
        .staging
        .collect_outputs(&folder)
        .await?
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();

    Ok(PollOutcome {
        dag_run_id: run_id,
        state: terminal,
        details: Some(snapshot.raw),
        outputs: (!outputs.is_empty()).then_some(outputs),
        completed_at,
    })
}

/// Parse the engine's `end_date`; null or blank means not reported.
fn parse_completed_at(end_date: Option<&Value>) -> Result<Option<DateTime<Utc>>, String> {
    let raw = match end_date {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim(),
        Some(other) => return Err(format!("end_date is not a string: {other}")),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| format!("unparsable end_date '{raw}'"))
}
