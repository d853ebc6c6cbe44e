//! Run identity and state types shared across the gateway

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CommonError, Result};

/// Prefix carried by every gateway-generated run id.
pub const RUN_ID_PREFIX: &str = "gw_";

/// Maximum accepted length for a caller-supplied run id.
pub const MAX_RUN_ID_LEN: usize = 128;

/// Identifier of a single run.
///
/// The same value is used as the engine's run id and as the name of the run's
/// staging folder, so it is restricted to characters that are safe as a single
/// path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh run id from 128 random bits.
    pub fn generate() -> Self {
        Self(format!("{}{}", RUN_ID_PREFIX, Uuid::new_v4().simple()))
    }

    /// Parse a run id received from a caller.
    pub fn parse(value: &str) -> Result<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_RUN_ID_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(CommonError::InvalidRunId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Year/week period a submitted batch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodMetadata {
    pub week_year: i32,
    pub week_num: u32,
}

/// State of a run as reported back to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Success,
    Failed,
    /// Not terminal yet, or the poll budget ran out before it was.
    Running,
}

impl RunState {
    /// Map an engine-reported state to a terminal state, ignoring case.
    ///
    /// Returns `None` for every non-terminal state (queued, running, ...).
    pub fn terminal(engine_state: &str) -> Option<Self> {
        match engine_state.trim().to_ascii_lowercase().as_str() {
            "success" => Some(RunState::Success),
            "failed" => Some(RunState::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Success => "success",
            RunState::Failed => "failed",
            RunState::Running => "running",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_run_id_shape() {
        let id = RunId::generate();
        let hex = id.as_str().strip_prefix(RUN_ID_PREFIX).unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_run_ids_differ() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn test_generated_run_id_round_trips_through_parse() {
        let id = RunId::generate();
        assert_eq!(RunId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_path_components() {
        assert!(RunId::parse("").is_err());
        assert!(RunId::parse("..").is_err());
        assert!(RunId::parse("../etc").is_err());
        assert!(RunId::parse("a/b").is_err());
        assert!(RunId::parse("a\\b").is_err());
        assert!(RunId::parse(&"a".repeat(MAX_RUN_ID_LEN + 1)).is_err());
        assert!(RunId::parse("gw_test-1").is_ok());
    }

    #[test]
    fn test_terminal_state_is_case_insensitive() {
        assert_eq!(RunState::terminal("SUCCESS"), Some(RunState::Success));
        assert_eq!(RunState::terminal("Failed"), Some(RunState::Failed));
        assert_eq!(RunState::terminal("running"), None);
        assert_eq!(RunState::terminal("queued"), None);
        assert_eq!(RunState::terminal(""), None);
    }

    #[test]
    fn test_run_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RunState::Running).unwrap(), "\"running\"");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
