use chrono::{DateTime, Utc};
use gateway_common::{RunId, RunState};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Workflow a caller may submit to or poll
///
/// Callers use the short selector (`part1`, `part2`); the engine knows the
/// workflows by their DAG id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workflow {
    Part1,
    Part2,
}

impl Workflow {
    pub const ALL: [Workflow; 2] = [Workflow::Part1, Workflow::Part2];

    pub fn dag_id(self) -> &'static str {
        match self {
            Workflow::Part1 => "part1_ingestion",
            Workflow::Part2 => "part2_qbo_export",
        }
    }

    pub fn selector(self) -> &'static str {
        match self {
            Workflow::Part1 => "part1",
            Workflow::Part2 => "part2",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dag_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid dag value '{0}'. Use part1 or part2.")]
pub struct UnknownWorkflow(pub String);

impl FromStr for Workflow {
    type Err = UnknownWorkflow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Workflow::ALL
            .into_iter()
            .find(|w| w.selector() == s)
            .ok_or_else(|| UnknownWorkflow(s.to_string()))
    }
}

/// Outcome of a submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
}

/// Returned to the caller once the engine accepted a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRunResponse {
    pub run_id: RunId,
    pub dag_run_id: RunId,
    pub status: SubmissionStatus,
    /// Names of the staged input files, in upload order.
    pub files: Vec<String>,
}

/// Latest known state of a run, with outputs once terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub dag_run_id: RunId,
    pub state: RunState,
    pub details: Option<Value>,
    pub outputs: Option<Vec<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PollOutcome {
    /// Message placed in `details` when the poll budget runs out.
    pub const BUDGET_EXCEEDED: &'static str = "Max polling attempts exceeded";

    /// Non-terminal outcome returned when no terminal state was observed.
    pub fn budget_exhausted(run_id: RunId) -> Self {
        Self {
            dag_run_id: run_id,
            state: RunState::Running,
            details: Some(json!({ "message": Self::BUDGET_EXCEEDED })),
            outputs: None,
            completed_at: None,
        }
    }
}
