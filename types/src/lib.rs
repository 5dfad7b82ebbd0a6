//! Core domain types for differing.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod ids;
pub use ids::{CommitId, DiffId, InvalidDiffId, WORKING_DIFF_ID};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("message must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

// ============================================================================
// Diff Records
// ============================================================================

/// Line-change totals for one diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub files: usize,
    pub additions: u64,
    pub deletions: u64,
}

impl DiffStat {
    /// Add one numstat row. Binary rows (`None`) count as a file but add no lines.
    pub fn add_file(&mut self, lines: Option<(u64, u64)>) {
        self.files += 1;
        if let Some((added, deleted)) = lines {
            self.additions = self.additions.saturating_add(added);
            self.deletions = self.deletions.saturating_add(deleted);
        }
    }
}

/// One selectable entry in the diff list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub id: DiffId,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub files_count: usize,
    pub additions: u64,
    pub deletions: u64,
}

impl DiffSummary {
    #[must_use]
    pub fn working(stat: DiffStat, now: DateTime<Utc>) -> Self {
        Self {
            id: DiffId::Working,
            message: "Working Changes".to_string(),
            author: String::new(),
            timestamp: now,
            files_count: stat.files,
            additions: stat.additions,
            deletions: stat.deletions,
        }
    }

    #[must_use]
    pub fn for_commit(commit: &CommitInfo, stat: DiffStat) -> Self {
        Self {
            id: DiffId::Commit(commit.id.clone()),
            message: commit.message.clone(),
            author: commit.author.clone(),
            timestamp: commit.timestamp,
            files_count: stat.files,
            additions: stat.additions,
            deletions: stat.deletions,
        }
    }
}

/// How a file differs between the two sides of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
}

impl FileStatus {
    /// Map a git `--name-status` letter. Everything but `A` and `D` is a modification.
    #[must_use]
    pub fn from_git_letter(letter: &str) -> Self {
        match letter.chars().next() {
            Some('A') => FileStatus::Added,
            Some('D') => FileStatus::Deleted,
            _ => FileStatus::Modified,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeRecord {
    pub path: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
}

/// Both sides of one file's diff, decoded as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentPair {
    pub path: String,
    pub old_content: String,
    pub new_content: String,
}

/// Commit metadata as read from `git log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// Only the HEAD commit can be amended.
    pub is_head: bool,
}

impl CommitRecord {
    #[must_use]
    pub fn from_info(info: CommitInfo, head: Option<&CommitId>) -> Self {
        let is_head = head.is_some_and(|head| *head == info.id);
        Self {
            id: info.id,
            message: info.message,
            author: info.author,
            timestamp: info.timestamp,
            is_head,
        }
    }
}

/// Result of a successful commit-message amend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmendOutcome {
    pub new_commit: CommitId,
    pub previous_commit: CommitId,
    /// Set when the pre-amend commit is already on a remote-tracking branch.
    pub warning: Option<String>,
}

/// Result of writing a working-tree file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: String,
    pub bytes_written: usize,
}
