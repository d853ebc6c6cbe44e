use std::path::PathBuf;
use thiserror::Error;

/// Filesystem failures while staging or reading back a run
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Shared staging root {path} is not usable: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create run folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write staged file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read outputs in {path}: {source}")]
    ReadOutputs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
