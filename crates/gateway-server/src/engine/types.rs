//! Payloads exchanged with the workflow engine

use gateway_common::{PeriodMetadata, RunId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a submit-run call
///
/// `conf` is forwarded to the engine verbatim; it always carries the
/// period, the notification address, and `input_subdir`, the run folder
/// relative to the shared root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub dag_run_id: RunId,
    pub conf: Map<String, Value>,
}

impl SubmissionRequest {
    pub fn new(
        run_id: RunId,
        period: PeriodMetadata,
        notify_email: &str,
        input_subdir: impl Into<String>,
    ) -> Self {
        let mut conf = Map::new();
        conf.insert("week_year".to_string(), Value::from(period.week_year));
        conf.insert("week_num".to_string(), Value::from(period.week_num));
        conf.insert("notify_email".to_string(), Value::from(notify_email));
        conf.insert("input_subdir".to_string(), Value::from(input_subdir.into()));

        Self {
            dag_run_id: run_id,
            conf,
        }
    }

    pub fn input_subdir(&self) -> Option<&str> {
        self.conf.get("input_subdir").and_then(Value::as_str)
    }
}

/// Engine acknowledgment of a submitted run
#[derive(Debug, Clone, PartialEq)]
pub struct DagRunAck {
    pub state: Option<String>,
    pub raw: Value,
}

impl From<Value> for DagRunAck {
    fn from(raw: Value) -> Self {
        let state = raw.get("state").and_then(Value::as_str).map(str::to_string);
        Self { state, raw }
    }
}

/// Status of a run as last reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatusSnapshot {
    /// Engine state, lowercased; empty when the engine omitted it.
    pub state: String,
    /// Raw `end_date` value, when present.
    pub end_date: Option<Value>,
    /// Full response, returned to callers as `details`.
    pub raw: Value,
}

impl From<Value> for RunStatusSnapshot {
    fn from(raw: Value) -> Self {
        let state = raw
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let end_date = raw.get("end_date").filter(|v| !v.is_null()).cloned();

        Self {
            state,
            end_date,
            raw,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_request_conf() {
        let run_id = RunId::parse("gw_1").unwrap();
        let request = SubmissionRequest::new(
            run_id,
            PeriodMetadata {
                week_year: 2023,
                week_num: 10,
            },
            "demo@example.com",
            "runs/gw_1",
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "dag_run_id": "gw_1",
                "conf": {
                    "week_year": 2023,
                    "week_num": 10,
                    "notify_email": "demo@example.com",
                    "input_subdir": "runs/gw_1"
                }
            })
        );
        assert_eq!(request.input_subdir(), Some("runs/gw_1"));
    }

    #[test]
    fn test_snapshot_normalizes_state() {
        let snapshot = RunStatusSnapshot::from(json!({"state": "SUCCESS", "end_date": null}));
        assert_eq!(snapshot.state, "success");
        assert!(snapshot.end_date.is_none());

        let empty = RunStatusSnapshot::from(json!({}));
        assert_eq!(empty.state, "");
    }

    #[test]
    fn test_ack_reads_state() {
        let ack = DagRunAck::from(json!({"dag_run_id": "gw_1", "state": "queued"}));
        assert_eq!(ack.state.as_deref(), Some("queued"));
    }
}
