use std::collections::HashMap;

use differing_types::{DiffId, FileChangeRecord};

use crate::error::RepoError;
use crate::git::describe;
use crate::git::parse::parse_name_status;
use crate::service::RepoService;

impl RepoService {
    /// Files that differ between the diff's base and the working tree, sorted by path.
    ///
    /// For a commit this is the cumulative change from its parent through to the
    /// current working tree, not the commit's own patch.
    pub async fn list_files(&self, id: &DiffId) -> Result<Vec<FileChangeRecord>, RepoError> {
        let base = self.diff_base(id).await?;

        let args = ["diff", "--name-status", "-z", "--no-renames", base.rev(), "--"];
        let out = self.git_output(&args).await?;
        let statuses =
            parse_name_status(&out).map_err(|e| RepoError::git(describe(&args), e.to_string()))?;

        let counts: HashMap<String, Option<(u64, u64)>> = self
            .numstat(&[base.rev()])
            .await?
            .into_iter()
            .map(|entry| (entry.path, entry.lines))
            .collect();

        let mut files: Vec<FileChangeRecord> = statuses
            .into_iter()
            .map(|(status, path)| {
                let (additions, deletions) =
                    counts.get(&path).copied().flatten().unwrap_or((0, 0));
                FileChangeRecord {
                    path,
                    status,
                    additions,
                    deletions,
                }
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
