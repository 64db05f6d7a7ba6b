//! Workspace temp files
//!
//! Files a step needs only for the duration of one engine invocation live
//! under the workspace's `@tmp/` directory, the location CI hosts clean
//! between builds.

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the per-workspace temp directory
pub const WORKSPACE_TMP_DIR: &str = "@tmp";

/// Creates uniquely named files under `<workspace>/@tmp/`
///
/// # Example
///
/// ```rust
/// use dockstep::TempFileManager;
/// use tempfile::TempDir;
///
/// let workspace = TempDir::new().unwrap();
/// let manager = TempFileManager::new(workspace.path(), "my-job", "123").unwrap();
///
/// let file = manager.write("Dockerfile", "FROM alpine\n").unwrap();
/// assert!(file.path().exists());
/// ```
#[derive(Debug, Clone)]
pub struct TempFileManager {
    job_name: String,
    build_id: String,
    tmp_dir: PathBuf,
}

impl TempFileManager {
    /// Creates a manager, creating `@tmp/` if needed
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory cannot be created
    pub fn new(
        workspace: impl AsRef<Path>,
        job_name: &str,
        build_id: &str,
    ) -> std::io::Result<Self> {
        let tmp_dir = workspace.as_ref().join(WORKSPACE_TMP_DIR);
        fs::create_dir_all(&tmp_dir)?;

        Ok(Self {
            job_name: sanitize(job_name),
            build_id: sanitize(build_id),
            tmp_dir,
        })
    }

    /// Writes `content` to a new file whose name starts with `prefix`
    ///
    /// The file is removed when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be written
    pub fn write(&self, prefix: &str, content: &str) -> std::io::Result<TempFile> {
        let path = self.tmp_dir.join(format!(
            "{}-{}-{}-{}",
            prefix,
            self.job_name,
            self.build_id,
            Uuid::new_v4()
        ));
        fs::write(&path, content)?;
        Ok(TempFile { path })
    }

    /// Returns the temp directory path
    #[must_use]
    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }
}

/// A temp file removed on drop
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Returns the file's path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Could not remove temp file");
        }
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
