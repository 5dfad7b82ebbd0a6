//! Both sides of a file's diff, and saving edits back to the working tree.

use differing_types::{DiffId, FileContentPair, SaveOutcome};

use crate::error::RepoError;
use crate::git::parse::{TreeEntry, parse_ls_tree_entry};
use crate::git::{describe, failure_detail};
use crate::revision::Base;
use crate::service::RepoService;
use crate::validate::RepoPath;

impl RepoService {
    /// Old side from the diff's base tree, new side from disk. Either side is empty
    /// when the file does not exist there.
    pub async fn resolve_content(
        &self,
        id: &DiffId,
        raw_path: &str,
    ) -> Result<FileContentPair, RepoError> {
        let base = self.diff_base(id).await?;
        let path = self.validate_for_read(raw_path, &base).await?;

        let old_content = self.read_blob(&base, &path).await?.unwrap_or_default();
        let rel = path.to_string();
        let new_content = self
            .blocking(move |files| files.read_to_string(&rel))
            .await?
            .unwrap_or_default();

        Ok(FileContentPair {
            path: path.to_string(),
            old_content,
            new_content,
        })
    }

    /// Overwrite a tracked working-tree file. Validation failures mean nothing is written.
    pub async fn save_file(
        &self,
        raw_path: &str,
        content: String,
    ) -> Result<SaveOutcome, RepoError> {
        let path = self.validate(raw_path).await?;
        let rel = path.to_string();
        let bytes_written = self
            .blocking(move |files| files.write_existing(&rel, content.as_bytes()))
            .await?;
        tracing::info!(path = %path, bytes = bytes_written, "saved working-tree file");
        Ok(SaveOutcome {
            path: path.to_string(),
            bytes_written,
        })
    }

    /// The entry for `path` in the base tree, if it has one.
    pub(crate) async fn tree_entry(
        &self,
        base: &Base,
        path: &RepoPath,
    ) -> Result<Option<TreeEntry>, RepoError> {
        let args = ["ls-tree", "-z", base.rev(), "--", path.as_str()];
        let out = self.git_output(&args).await?;
        parse_ls_tree_entry(&out).map_err(|e| RepoError::git(describe(&args), e.to_string()))
    }

    async fn read_blob(&self, base: &Base, path: &RepoPath) -> Result<Option<String>, RepoError> {
        let Some(entry) = self.tree_entry(base, path).await? else {
            return Ok(None);
        };
        // Submodules and directories have no text to show.
        if !entry.is_blob() {
            return Ok(None);
        }

        let args = ["cat-file", "blob", entry.object.as_str()];
        let out = self.git_run(&args).await?;
        if !out.success {
            return Err(RepoError::git(describe(&args), failure_detail(&out)));
        }
        if out.truncated_stdout {
            return Err(RepoError::TooLarge {
                path: path.to_string(),
                limit: self.files().max_read_bytes(),
            });
        }
        Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()))
    }
}
