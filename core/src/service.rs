use std::path::Path;
use std::time::Duration;

use differing_config::DifferingConfig;
use tokio::sync::OnceCell;

use crate::error::RepoError;
use crate::git::{GitOutput, GitRunner};
use crate::root::RepositoryRoot;
use crate::rooted::RootedDir;

/// Limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoSettings {
    pub git_timeout: Duration,
    /// Cap on git stdout per invocation and on working-tree file reads.
    pub max_output_bytes: usize,
    /// Recent commits shown after the working entry.
    pub max_commits: usize,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self::from(&DifferingConfig::default())
    }
}

impl From<&DifferingConfig> for RepoSettings {
    fn from(config: &DifferingConfig) -> Self {
        Self {
            git_timeout: config.git_timeout(),
            max_output_bytes: config.max_output_bytes(),
            max_commits: config.max_commits(),
        }
    }
}

/// Everything a request needs: the resolved root, a rooted file handle, and a git runner.
///
/// Built once at startup and shared behind an `Arc`; no field changes afterwards.
#[derive(Debug)]
pub struct RepoService {
    root: RepositoryRoot,
    files: RootedDir,
    git: GitRunner,
    max_commits: usize,
    pub(crate) empty_tree_id: OnceCell<String>,
}

impl RepoService {
    /// Locate git, resolve the repository enclosing `start_dir`, and open it.
    pub async fn open(start_dir: &Path, settings: RepoSettings) -> Result<Self, RepoError> {
        let git = GitRunner::locate(settings.git_timeout, settings.max_output_bytes)?;
        Self::with_runner(start_dir, git, settings).await
    }

    pub async fn with_runner(
        start_dir: &Path,
        git: GitRunner,
        settings: RepoSettings,
    ) -> Result<Self, RepoError> {
        let root = RepositoryRoot::resolve(&git, start_dir).await?;
        let files = RootedDir::new(root.path(), settings.max_output_bytes)?;
        tracing::info!(
            root = %root.path().display(),
            git = %git.git_bin().display(),
            "repository opened"
        );
        Ok(Self {
            root,
            files,
            git,
            max_commits: settings.max_commits.max(1),
            empty_tree_id: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    #[must_use]
    pub fn files(&self) -> &RootedDir {
        &self.files
    }

    #[must_use]
    pub fn max_commits(&self) -> usize {
        self.max_commits
    }

    pub(crate) async fn git_run(&self, args: &[&str]) -> Result<GitOutput, RepoError> {
        self.git.run(self.root.path(), args).await
    }

    pub(crate) async fn git_output(&self, args: &[&str]) -> Result<Vec<u8>, RepoError> {
        self.git.output(self.root.path(), args).await
    }

    pub(crate) async fn git_text(&self, args: &[&str]) -> Result<String, RepoError> {
        self.git.text(self.root.path(), args).await
    }

    /// Run blocking filesystem work off the async workers.
    pub(crate) async fn blocking<T, F>(&self, f: F) -> Result<T, RepoError>
    where
        T: Send + 'static,
        F: FnOnce(RootedDir) -> Result<T, RepoError> + Send + 'static,
    {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || f(files))
            .await
            .map_err(|e| RepoError::io("<blocking task>", std::io::Error::other(e)))?
    }
}
