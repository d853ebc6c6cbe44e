use thiserror::Error;

/// Failure of a call to the workflow engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine answered with a non-2xx status.
    #[error("Workflow engine returned {status_code}: {body}")]
    Request { status_code: u16, body: String },

    /// No usable response (connect failure, timeout, broken stream).
    #[error("Workflow engine unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body is not the expected JSON.
    #[error("Workflow engine sent an unreadable response: {0}")]
    Decode(String),
}

impl EngineError {
    /// Status code reported by the engine, if it answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            EngineError::Request { status_code, .. } => Some(*status_code),
            EngineError::Transport(e) => e.status().map(|s| s.as_u16()),
            EngineError::Decode(_) => None,
        }
    }

    /// Text the engine sent back, or the transport error description.
    pub fn detail(&self) -> String {
        match self {
            EngineError::Request { body, .. } => body.clone(),
            EngineError::Transport(e) => e.to_string(),
            EngineError::Decode(msg) => msg.clone(),
        }
    }
}
