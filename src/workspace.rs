//! Disposable build-tree lifecycle

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Errors creating workspace directories.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("creating workspace root in {}: {}", .dir.display(), .source)]
    CreateRoot { dir: PathBuf, source: std::io::Error },

    #[error("creating scratch directory: {0}")]
    CreateScratch(std::io::Error),
}

/// A run-scoped scratch tree under the output directory.
///
/// The root is created once per run and removed wholesale by [`cleanup`];
/// scratch directories are never removed individually while the run is
/// in flight.
///
/// [`cleanup`]: Workspace::cleanup
pub struct Workspace {
    root: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Create the workspace root (`build-*`) under `output_dir`.
    pub fn create(output_dir: &Path, keep: bool) -> Result<Self, WorkspaceError> {
        let root = tempfile::Builder::new()
            .prefix("build-")
            .tempdir_in(output_dir)
            .map_err(|source| WorkspaceError::CreateRoot {
                dir: output_dir.to_path_buf(),
                source,
            })?
            .keep();

        debug!(root = %root.display(), "created workspace root");

        Ok(Self { root, keep })
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named scratch directory for one job.
    pub fn scratch(&self, prefix: &str) -> Result<PathBuf, WorkspaceError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}-"))
            .tempdir_in(&self.root)
            .map_err(WorkspaceError::CreateScratch)?
            .keep();

        debug!(dir = %dir.display(), "created scratch directory");

        Ok(dir)
    }

    /// Remove the workspace tree. Removal failures are logged and swallowed;
    /// retention skips removal entirely.
    pub fn cleanup(&self) {
        if self.keep {
            info!(root = %self.root.display(), "keeping build directory");
            return;
        }

        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            warn!(root = %self.root.display(), error = %e, "failed to remove build directory");
        }
    }
}
