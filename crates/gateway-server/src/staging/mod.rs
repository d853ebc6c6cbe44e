//! Run staging on the shared filesystem
//!
//! Every run owns `<shared_root>/runs/<run_id>/`. Uploaded inputs are written
//! at the top level of that folder; the workflow engine later writes results
//! into its `outputs/` subdirectory. The folder itself is the only persisted
//! state of a run.

use gateway_common::RunId;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub mod error;

pub use error::StagingError;

/// Directory under the shared root that holds one folder per run.
pub const RUNS_DIR: &str = "runs";

/// Subdirectory of a run folder populated by the engine.
pub const OUTPUTS_DIR: &str = "outputs";

/// Extension of input and output files.
pub const TABULAR_EXTENSION: &str = "csv";

/// Generate a fresh run id.
pub fn create_run_id() -> RunId {
    RunId::generate()
}

/// Path of a run folder relative to the shared root, as handed to the engine.
pub fn input_subdir(run_id: &RunId) -> String {
    format!("{}/{}", RUNS_DIR, run_id)
}

/// A file received from a client, already accepted by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Name as supplied by the client; may contain directory components.
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: Some(filename.into()),
            content: content.into(),
        }
    }

    /// Basename safe to join onto a run folder.
    ///
    /// Client-side directories are stripped for both `/` and `\` separators.
    /// Missing or unusable names get a generated `upload_<hex>.csv` name.
    pub fn safe_name(&self) -> String {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit(['/', '\\']).next())
            .map(str::trim)
            .filter(|base| !base.is_empty() && *base != "." && *base != "..")
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload_{}.{}", Uuid::new_v4().simple(), TABULAR_EXTENSION))
    }
}

/// Handle on the shared staging root
#[derive(Debug, Clone)]
pub struct RunStaging {
    root: PathBuf,
}

impl RunStaging {
    /// Create a staging handle rooted at `shared_root`.
    ///
    /// Relative roots are made absolute against the current directory so that
    /// output paths reported to callers are always absolute.
    pub fn new(shared_root: impl AsRef<Path>) -> Result<Self, StagingError> {
        let shared_root = shared_root.as_ref();
        let root = std::path::absolute(shared_root).map_err(|source| StagingError::Root {
            path: shared_root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the shared root itself; called once at startup.
    pub async fn ensure_root(&self) -> Result<(), StagingError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StagingError::Root {
                path: self.root.clone(),
                source,
            })
    }

    /// Folder of a run, whether or not it exists yet.
    pub fn run_folder(&self, run_id: &RunId) -> PathBuf {
        self.root.join(RUNS_DIR).join(run_id.as_str())
    }

    /// Create the run folder (and parents) if missing.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn ensure_run_folder(&self, run_id: &RunId) -> Result<PathBuf, StagingError> {
        let folder = self.run_folder(run_id);

        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|source| StagingError::CreateFolder {
                path: folder.clone(),
                source,
            })?;

        debug!(folder = %folder.display(), "Run folder ready");
        Ok(folder)
    }

    /// Write every upload into `folder` and return the stored names in order.
    ///
    /// Uploads resolving to the same basename overwrite each other; the last
    /// one wins.
    #[instrument(skip(self, uploads), fields(folder = %folder.display(), count = uploads.len()))]
    pub async fn persist_uploads(
        &self,
        folder: &Path,
        uploads: &[Upload],
    ) -> Result<Vec<String>, StagingError> {
        let mut saved = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let name = upload.safe_name();
            let destination = folder.join(&name);

            tokio::fs::write(&destination, &upload.content)
                .await
                .map_err(|source| StagingError::WriteFile {
                    path: destination.clone(),
                    source,
                })?;

            debug!(file = %name, size = upload.content.len(), "Staged upload");
            saved.push(name);
        }

        info!(files = saved.len(), "Uploads staged");
        Ok(saved)
    }

    /// List `.csv` files directly under `<folder>/outputs`, sorted.
    ///
    /// A missing `outputs` directory yields an empty list.
    pub async fn collect_outputs(&self, folder: &Path) -> Result<Vec<PathBuf>, StagingError> {
        let outputs_dir = folder.join(OUTPUTS_DIR);

        let mut entries = match tokio::fs::read_dir(&outputs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StagingError::ReadOutputs {
                    path: outputs_dir,
                    source,
                })
            },
        };

        let read_err = |source| StagingError::ReadOutputs {
            path: outputs_dir.clone(),
            source,
        };

        let mut outputs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map_err(read_err)?.is_file();
            if is_file && has_tabular_extension(&path) {
                outputs.push(path);
            }
        }

        outputs.sort();
        Ok(outputs)
    }

    /// Remove a run folder, logging instead of failing.
    pub async fn cleanup_run_folder(&self, folder: &Path) {
        match tokio::fs::remove_dir_all(folder).await {
            Ok(()) => info!(folder = %folder.display(), "Removed run folder"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(
                folder = %folder.display(),
                error = %e,
                "Failed to remove run folder"
            ),
        }
    }
}

/// Removes a run folder when dropped, unless disarmed first
///
/// Covers submissions whose future is dropped mid-flight (client gone,
/// shutdown deadline). Removal happens synchronously in `drop`.
#[derive(Debug)]
pub struct RunFolderGuard {
    folder: Option<PathBuf>,
}

impl RunFolderGuard {
    pub fn arm(folder: PathBuf) -> Self {
        Self {
            folder: Some(folder),
        }
    }

    /// Keep the folder; it is now owned elsewhere or already handled.
    pub fn disarm(mut self) {
        self.folder = None;
    }
}

impl Drop for RunFolderGuard {
    fn drop(&mut self) {
        let Some(folder) = self.folder.take() else {
            return;
        };

        match std::fs::remove_dir_all(&folder) {
            Ok(()) => warn!(folder = %folder.display(), "Removed run folder of abandoned submission"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(
                folder = %folder.display(),
                error = %e,
                "Failed to remove run folder of abandoned submission"
            ),
        }
    }
}

fn has_tabular_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TABULAR_EXTENSION))
}
