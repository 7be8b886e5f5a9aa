//! Per-execution scratch workspaces
//!
//! An [`ExecutionSession`] binds a freshly generated identifier to one
//! scratch directory on the host. The directory holds the materialized
//! source file and is bind-mounted into the sandbox container. Teardown is
//! guaranteed: callers may invoke [`ExecutionSession::cleanup`] explicitly,
//! and `Drop` covers every other exit path (error returns, timeouts,
//! panics). Cleanup failures are logged, never raised, so they cannot mask
//! an already computed execution result.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sandbox::languages::LanguageProfile;

/// One execution attempt's identity and scratch directory
#[derive(Debug)]
pub struct ExecutionSession {
    /// Unique session identifier
    id: String,
    /// Workspace directory, exclusively owned by this session
    root: PathBuf,
    cleaned: bool,
}

impl ExecutionSession {
    /// Create a fresh session under the scratch root.
    ///
    /// The identifier is generated here, never caller-supplied, so no two
    /// concurrent sessions can share a workspace path.
    pub fn create(scratch_root: &Path) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let root = scratch_root.join(&id);

        std::fs::create_dir_all(&root).map_err(|e| {
            Error::Filesystem(format!(
                "Failed to create workspace {}: {}",
                root.display(),
                e
            ))
        })?;

        debug!(session = %id, workspace = %root.display(), "Created session workspace");

        Ok(ExecutionSession {
            id,
            root,
            cleaned: false,
        })
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Workspace directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the submitted source verbatim into the workspace as
    /// `code.<ext>` and return the file's basename.
    ///
    /// No size limit is enforced here; callers are responsible for bounding
    /// the code size upstream.
    pub fn materialize(&self, code: &str, profile: &LanguageProfile) -> Result<String> {
        let file_name = format!("code.{}", profile.extension);
        let path = self.root.join(&file_name);

        std::fs::write(&path, code).map_err(|e| {
            Error::Filesystem(format!("Failed to write source {}: {}", path.display(), e))
        })?;

        debug!(session = %self.id, file = %file_name, bytes = code.len(), "Materialized source");

        Ok(file_name)
    }

    /// Remove the workspace directory recursively.
    ///
    /// Idempotent: a missing directory is not an error, and repeated calls
    /// are no-ops. Failures are logged and swallowed.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(session = %self.id, "Removed session workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session = %self.id,
                workspace = %self.root.display(),
                "Failed to remove workspace: {}", e
            ),
        }
    }
}

impl Drop for ExecutionSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
