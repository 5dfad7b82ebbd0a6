//! The diff list and the commit ranges behind each diff.

use chrono::Utc;
use differing_types::{CommitId, CommitInfo, CommitRecord, DiffId, DiffStat, DiffSummary};

use crate::error::RepoError;
use crate::git::describe;
use crate::git::parse::{LOG_FORMAT, NumstatEntry, parse_log, parse_numstat, sum_numstat};
use crate::service::RepoService;

impl RepoService {
    /// The working entry first, then the most recent commits, newest first.
    ///
    /// The working entry is always present, even when nothing differs.
    pub async fn list_diffs(&self) -> Result<Vec<DiffSummary>, RepoError> {
        let head = self.head().await?;
        let working_base = match &head {
            Some(head) => head.to_string(),
            None => self.empty_tree().await?,
        };
        let working = self.numstat(&[working_base.as_str()]).await?;
        let mut diffs = vec![DiffSummary::working(sum_numstat(&working), Utc::now())];

        let Some(head) = head else {
            return Ok(diffs);
        };
        for commit in self.recent_commits(&head).await? {
            let stat = self.commit_stat(&commit.id).await?;
            diffs.push(DiffSummary::for_commit(&commit, stat));
        }
        Ok(diffs)
    }

    /// Commits covered by a diff, newest first, HEAD always leading.
    ///
    /// For a commit C that is everything in `(parent(C), HEAD]`; for the working
    /// diff it is the same recent window [`RepoService::list_diffs`] shows.
    pub async fn list_commits(&self, id: &DiffId) -> Result<Vec<CommitRecord>, RepoError> {
        let Some(head) = self.head().await? else {
            return match id {
                DiffId::Working => Ok(Vec::new()),
                DiffId::Commit(commit) => Err(RepoError::UnknownRevision {
                    id: commit.to_string(),
                }),
            };
        };

        let commits = match id {
            DiffId::Working => self.recent_commits(&head).await?,
            DiffId::Commit(commit) => {
                let full = self.resolve_commit(commit).await?;
                let exclude = self
                    .first_parent(&full)
                    .await?
                    .map(|parent| format!("^{parent}"));
                let mut args = vec!["log", LOG_FORMAT, head.as_str()];
                if let Some(exclude) = &exclude {
                    args.push(exclude.as_str());
                }
                args.push("--");
                self.log(&args).await?
            }
        };

        Ok(commits
            .into_iter()
            .map(|info| CommitRecord::from_info(info, Some(&head)))
            .collect())
    }

    async fn recent_commits(&self, head: &CommitId) -> Result<Vec<CommitInfo>, RepoError> {
        let limit = self.max_commits().to_string();
        self.log(&["log", LOG_FORMAT, "-n", limit.as_str(), head.as_str(), "--"])
            .await
    }

    async fn log(&self, args: &[&str]) -> Result<Vec<CommitInfo>, RepoError> {
        let text = self.git_text(args).await?;
        parse_log(&text).map_err(|e| RepoError::git(describe(args), e.to_string()))
    }

    /// Stat of one commit against its first parent, or the empty tree for a root commit.
    async fn commit_stat(&self, commit: &CommitId) -> Result<DiffStat, RepoError> {
        let base = match self.first_parent(commit).await? {
            Some(parent) => parent.to_string(),
            None => self.empty_tree().await?,
        };
        let entries = self.numstat(&[base.as_str(), commit.as_str()]).await?;
        Ok(sum_numstat(&entries))
    }

    /// `git diff --numstat` between `revs` (one rev means against the working tree).
    pub(crate) async fn numstat(&self, revs: &[&str]) -> Result<Vec<NumstatEntry>, RepoError> {
        let mut args = vec!["diff", "--numstat", "-z", "--no-renames"];
        args.extend_from_slice(revs);
        args.push("--");
        let out = self.git_output(&args).await?;
        parse_numstat(&out).map_err(|e| RepoError::git(describe(&args), e.to_string()))
    }
}
