//! Path validation: lexical rules, root containment, and the tracked-file check.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{PathRejection, RepoError};
use crate::git::parse::parse_path_list;
use crate::git::{describe, failure_detail};
use crate::revision::Base;
use crate::rooted::contains_unsafe_path_chars;
use crate::service::RepoService;

/// A repository-relative path with `.` and in-root `..` segments folded away.
///
/// Always `/`-separated and never empty; this is the spelling handed to git
/// and to the rooted file handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoPath(String);

impl RepoPath {
    pub fn parse(raw: &str) -> Result<Self, PathRejection> {
        if raw.is_empty() {
            return Err(PathRejection::Empty);
        }
        if contains_unsafe_path_chars(raw) {
            return Err(PathRejection::UnsafeCharacters);
        }
        if raw.starts_with('/') || raw.starts_with('\\') {
            return Err(PathRejection::Absolute);
        }

        let mut segments: Vec<&str> = Vec::new();
        for component in Path::new(raw).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        return Err(PathRejection::EscapesRoot);
                    }
                }
                Component::Normal(segment) => {
                    segments.push(segment.to_str().ok_or(PathRejection::UnsafeCharacters)?);
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PathRejection::Absolute);
                }
            }
        }

        if segments.is_empty() {
            return Err(PathRejection::NamesRoot);
        }
        Ok(Self(segments.join("/")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `root/rel`, normalized, is the root or lies beneath it.
#[must_use]
pub fn is_contained(root: &Path, rel: &str) -> bool {
    let joined = normalize_lexically(&root.join(rel));
    joined.starts_with(normalize_lexically(root))
}

impl RepoService {
    /// Gate for anything that writes: the path must be well-formed, inside the
    /// root, and tracked by git.
    pub async fn validate(&self, raw: &str) -> Result<RepoPath, RepoError> {
        let path = self.contained_path(raw)?;
        if !self.is_tracked(&path).await? {
            return Err(RepoError::NotTracked {
                path: path.to_string(),
            });
        }
        Ok(path)
    }

    /// Gate for reads against a diff: same shape rules, but a path that only
    /// exists on the old side (deleted since) is allowed too.
    pub async fn validate_for_read(&self, raw: &str, base: &Base) -> Result<RepoPath, RepoError> {
        let path = self.contained_path(raw)?;
        if self.is_tracked(&path).await? || self.tree_entry(base, &path).await?.is_some() {
            return Ok(path);
        }
        Err(RepoError::NotTracked {
            path: path.to_string(),
        })
    }

    /// Whether git's index has a file at exactly this path.
    pub async fn is_tracked(&self, path: &RepoPath) -> Result<bool, RepoError> {
        let args = ["ls-files", "-z", "--error-unmatch", "--", path.as_str()];
        let out = self.git_run(&args).await?;
        if !out.success {
            // --error-unmatch exits 1 when nothing matches.
            if out.exit_code == Some(1) {
                return Ok(false);
            }
            return Err(RepoError::git(describe(&args), failure_detail(&out)));
        }
        if out.truncated_stdout {
            return Err(RepoError::git(describe(&args), "output truncated"));
        }
        // A directory pathspec matches the files under it; only an exact hit counts.
        Ok(parse_path_list(&out.stdout)
            .iter()
            .any(|tracked| tracked == path.as_str()))
    }

    /// Both checks run on the caller's string; neither trusts the other's output.
    fn contained_path(&self, raw: &str) -> Result<RepoPath, RepoError> {
        let path = RepoPath::parse(raw).map_err(|reason| RepoError::invalid_path(raw, reason))?;
        if !is_contained(self.root(), raw) {
            return Err(RepoError::invalid_path(raw, PathRejection::EscapesRoot));
        }
        Ok(path)
    }
}
