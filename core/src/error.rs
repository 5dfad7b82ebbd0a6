use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use differing_types::InvalidDiffId;
use thiserror::Error;

/// Why a caller-supplied path was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    Empty,
    Absolute,
    /// `..` segments that climb above the repository root.
    EscapesRoot,
    UnsafeCharacters,
    /// Normalizes to the root itself, which is not a file.
    NamesRoot,
    /// Resolves (through a symlink) to somewhere outside the root.
    OutsideRoot { resolved: PathBuf },
    /// Some component is a symlink, even one that stays inside the root.
    Symlink { resolved: PathBuf },
    /// Names something inside the `.git` directory.
    GitDir,
    NotAFile,
    /// Writes only ever replace an existing file.
    Missing,
}

impl fmt::Display for PathRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRejection::Empty => f.write_str("path is empty"),
            PathRejection::Absolute => f.write_str("absolute paths are not allowed"),
            PathRejection::EscapesRoot => f.write_str("path escapes the repository root"),
            PathRejection::UnsafeCharacters => f.write_str("path contains control characters"),
            PathRejection::NamesRoot => f.write_str("path names the repository root"),
            PathRejection::OutsideRoot { resolved } => {
                write!(f, "path resolves outside the repository: {}", resolved.display())
            }
            PathRejection::Symlink { resolved } => {
                write!(f, "path goes through a symlink to {}", resolved.display())
            }
            PathRejection::GitDir => f.write_str("path is inside the .git directory"),
            PathRejection::NotAFile => f.write_str("path is not a regular file"),
            PathRejection::Missing => f.write_str("file does not exist in the working tree"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a git repository: {} ({detail})", path.display())]
    NotARepository { path: PathBuf, detail: String },

    #[error("invalid file path {path:?}: {reason}")]
    InvalidPath { path: String, reason: PathRejection },

    #[error("file not tracked by git: {path}")]
    NotTracked { path: String },

    #[error("invalid diff id: {0}")]
    InvalidDiffId(#[from] InvalidDiffId),

    #[error("unknown revision: {id}")]
    UnknownRevision { id: String },

    #[error("commit message cannot be empty")]
    EmptyMessage,

    #[error("can only amend the HEAD commit (requested {target}, HEAD is {head})")]
    NotHead { target: String, head: String },

    #[error("file {path} exceeds the {limit} byte read limit")]
    TooLarge { path: String, limit: usize },

    #[error("git {command} failed: {detail}")]
    GitCommand { command: String, detail: String },

    #[error("git {command} timed out after {}ms", timeout.as_millis())]
    GitTimeout { command: String, timeout: Duration },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl RepoError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: PathRejection) -> Self {
        RepoError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        RepoError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn git(command: impl Into<String>, detail: impl Into<String>) -> Self {
        RepoError::GitCommand {
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// Extra context that belongs in a response body but not in the headline.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            RepoError::GitCommand { detail, .. } | RepoError::NotARepository { detail, .. } => {
                Some(detail.clone())
            }
            RepoError::InvalidPath { reason, .. } => Some(reason.to_string()),
            RepoError::Io { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}
