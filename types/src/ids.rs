use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel diff id for "HEAD vs. the live working tree".
pub const WORKING_DIFF_ID: &str = "working";

/// Shortest abbreviated object name git accepts.
const MIN_COMMIT_ID_LEN: usize = 4;
/// Full SHA-256 object name length.
const MAX_COMMIT_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDiffId {
    #[error("diff id must not be empty")]
    Empty,
    #[error("commit id must be {MIN_COMMIT_ID_LEN}-{MAX_COMMIT_ID_LEN} characters, got {0}")]
    Length(usize),
    #[error("commit id must be hexadecimal: {0}")]
    NotHex(String),
}

/// A hexadecimal object name, full or abbreviated.
///
/// This is the only form in which a caller-supplied revision ever reaches a git
/// argument list, so it cannot start with `-` or carry revision syntax (`^`, `~`, `:`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    pub fn new(value: impl AsRef<str>) -> Result<Self, InvalidDiffId> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(InvalidDiffId::Empty);
        }
        if !(MIN_COMMIT_ID_LEN..=MAX_COMMIT_ID_LEN).contains(&value.len()) {
            return Err(InvalidDiffId::Length(value.len()));
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidDiffId::NotHex(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitId {
    type Err = InvalidDiffId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = InvalidDiffId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommitId> for String {
    fn from(value: CommitId) -> Self {
        value.0
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which diff a request is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiffId {
    /// HEAD vs. the working tree (staged and unstaged changes together).
    Working,
    /// The commit's parent vs. the working tree.
    Commit(CommitId),
}

impl DiffId {
    #[must_use]
    pub fn is_working(&self) -> bool {
        matches!(self, DiffId::Working)
    }

    #[must_use]
    pub fn commit(&self) -> Option<&CommitId> {
        match self {
            DiffId::Working => None,
            DiffId::Commit(id) => Some(id),
        }
    }
}

impl fmt::Display for DiffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffId::Working => f.write_str(WORKING_DIFF_ID),
            DiffId::Commit(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl FromStr for DiffId {
    type Err = InvalidDiffId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == WORKING_DIFF_ID {
            Ok(DiffId::Working)
        } else {
            CommitId::new(s).map(DiffId::Commit)
        }
    }
}

impl TryFrom<String> for DiffId {
    type Error = InvalidDiffId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiffId> for String {
    fn from(value: DiffId) -> Self {
        value.to_string()
    }
}

impl From<CommitId> for DiffId {
    fn from(value: CommitId) -> Self {
        DiffId::Commit(value)
    }
}
