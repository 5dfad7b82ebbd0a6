use differing_types::{AmendOutcome, CommitId, NonEmptyString};

use crate::error::RepoError;
use crate::git::{describe, failure_detail};
use crate::service::RepoService;

pub const FORCE_PUSH_WARNING: &str =
    "This commit may have been pushed to a remote. You may need to force push.";

impl RepoService {
    /// Rewrite the message of the HEAD commit, and only the HEAD commit.
    ///
    /// Staged changes are left staged (`--only` with no paths). The returned warning
    /// is advisory: it never blocks the amend.
    pub async fn amend(&self, target: &CommitId, message: &str) -> Result<AmendOutcome, RepoError> {
        let message = NonEmptyString::new(message).map_err(|_| RepoError::EmptyMessage)?;

        let head = self.head().await?;
        let not_head = |head: Option<&CommitId>| RepoError::NotHead {
            target: target.to_string(),
            head: head.map_or_else(|| "(none)".to_string(), ToString::to_string),
        };
        let Some(head) = head else {
            return Err(not_head(None));
        };
        let resolved = match self.resolve_commit(target).await {
            Ok(resolved) => resolved,
            Err(RepoError::UnknownRevision { .. }) => return Err(not_head(Some(&head))),
            Err(e) => return Err(e),
        };
        if resolved != head {
            return Err(not_head(Some(&head)));
        }

        let message_arg = format!("--message={}", message.as_str());
        let args = [
            "commit",
            "--amend",
            "--only",
            "--allow-empty",
            "--no-verify",
            message_arg.as_str(),
        ];
        let out = self.git_run(&args).await?;
        if !out.success {
            let detail = if out.stderr.is_empty() {
                out.stdout_text().trim().to_string()
            } else {
                failure_detail(&out)
            };
            return Err(RepoError::git(describe(&args[..5]), detail));
        }

        let new_commit = self
            .head()
            .await?
            .ok_or_else(|| RepoError::git("rev-parse", "HEAD missing after amend"))?;
        let warning = self.remote_warning(&head).await;
        tracing::info!(previous = %head, new = %new_commit, "amended HEAD commit message");

        Ok(AmendOutcome {
            new_commit,
            previous_commit: head,
            warning,
        })
    }

    async fn remote_warning(&self, commit: &CommitId) -> Option<String> {
        match self
            .git_text(&["branch", "-r", "--contains", commit.as_str()])
            .await
        {
            Ok(text) if !text.trim().is_empty() => Some(FORCE_PUSH_WARNING.to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(commit = %commit, error = %e, "remote containment check failed");
                None
            }
        }
    }
}
