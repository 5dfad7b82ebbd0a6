//! Resolving diff ids to concrete revisions.

use differing_types::{CommitId, DiffId};

use crate::error::RepoError;
use crate::git::parse::parse_parents;
use crate::git::{describe, failure_detail};
use crate::service::RepoService;

/// The "old" side of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// A full commit id.
    Commit(CommitId),
    /// No parent to compare against (root commit, or nothing committed yet).
    EmptyTree(String),
}

impl Base {
    /// The argument to hand git for this side.
    #[must_use]
    pub fn rev(&self) -> &str {
        match self {
            Base::Commit(id) => id.as_str(),
            Base::EmptyTree(tree) => tree,
        }
    }
}

impl RepoService {
    /// Current HEAD commit, or `None` on an unborn branch.
    pub async fn head(&self) -> Result<Option<CommitId>, RepoError> {
        let args = ["rev-parse", "--verify", "--quiet", "HEAD^{commit}"];
        let out = self.git_run(&args).await?;
        if !out.success {
            if out.exit_code == Some(1) && out.stdout.is_empty() {
                return Ok(None);
            }
            return Err(RepoError::git(describe(&args), failure_detail(&out)));
        }
        let text = out.stdout_text();
        CommitId::new(text.trim())
            .map(Some)
            .map_err(|e| RepoError::git(describe(&args), format!("unexpected HEAD {text:?}: {e}")))
    }

    /// Expand a (possibly abbreviated) id to the full id of an existing commit.
    pub async fn resolve_commit(&self, id: &CommitId) -> Result<CommitId, RepoError> {
        let spec = format!("{id}^{{commit}}");
        let out = self
            .git_run(&["rev-parse", "--verify", "--quiet", spec.as_str()])
            .await?;
        if !out.success {
            return Err(RepoError::UnknownRevision { id: id.to_string() });
        }
        let text = out.stdout_text();
        CommitId::new(text.trim()).map_err(|_| RepoError::UnknownRevision { id: id.to_string() })
    }

    /// First parent of `commit`, or `None` for a root commit.
    pub async fn first_parent(&self, commit: &CommitId) -> Result<Option<CommitId>, RepoError> {
        let args = ["rev-list", "--parents", "-n", "1", commit.as_str()];
        let text = self.git_text(&args).await?;
        let (_, parents) =
            parse_parents(&text).map_err(|e| RepoError::git(describe(&args), e.to_string()))?;
        Ok(parents.into_iter().next())
    }

    /// Object id of the empty tree in this repository's hash format.
    pub async fn empty_tree(&self) -> Result<String, RepoError> {
        self.empty_tree_id
            .get_or_try_init(|| async {
                // Hashes without -w, so nothing is written to the object store.
                let args = ["hash-object", "-t", "tree", "--stdin"];
                let text = self.git_text(&args).await?;
                let tree = text.trim().to_string();
                if tree.is_empty() || !tree.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(RepoError::git(
                        describe(&args),
                        format!("unexpected tree id {tree:?}"),
                    ));
                }
                Ok(tree)
            })
            .await
            .cloned()
    }

    /// What the old side of `id` is compared from: HEAD for the working diff,
    /// the commit's first parent otherwise.
    pub async fn diff_base(&self, id: &DiffId) -> Result<Base, RepoError> {
        let base = match id {
            DiffId::Working => self.head().await?,
            DiffId::Commit(commit) => {
                let full = self.resolve_commit(commit).await?;
                self.first_parent(&full).await?
            }
        };
        match base {
            Some(commit) => Ok(Base::Commit(commit)),
            None => Ok(Base::EmptyTree(self.empty_tree().await?)),
        }
    }
}
