use std::path::{Path, PathBuf};

use crate::error::RepoError;
use crate::git::{GitRunner, failure_detail};

/// Canonical top-level directory of the working tree being served.
///
/// For a linked worktree this is the worktree's own directory, not the main checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRoot(PathBuf);

impl RepositoryRoot {
    pub async fn resolve(git: &GitRunner, start_dir: &Path) -> Result<Self, RepoError> {
        let not_repo = |detail: String| RepoError::NotARepository {
            path: start_dir.to_path_buf(),
            detail,
        };

        if !start_dir.is_dir() {
            return Err(not_repo("directory does not exist".to_string()));
        }

        let out = git
            .run(start_dir, &["rev-parse", "--show-toplevel"])
            .await?;
        if !out.success {
            return Err(not_repo(failure_detail(&out)));
        }

        let reported = out.stdout_text();
        let reported = reported.trim_end_matches(['\r', '\n']);
        if reported.is_empty() {
            return Err(not_repo("git reported no working tree".to_string()));
        }

        let canonical = tokio::fs::canonicalize(reported)
            .await
            .map_err(|e| RepoError::io(reported, e))?;
        tracing::debug!(root = %canonical.display(), "resolved repository root");
        Ok(Self(canonical))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}
