//! Server startup error types

use thiserror::Error;

use crate::engine::EngineError;
use crate::staging::StagingError;

/// Result type alias for server startup
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Failures while assembling the server from its configuration
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Shared input folder unavailable: {0}")]
    Staging(#[from] StagingError),

    #[error("Workflow engine client could not be built: {0}")]
    Engine(#[from] EngineError),
}
