//! Parsers for the machine-readable output we ask git for.
//!
//! Path-bearing output is always requested with `-z`, so paths arrive verbatim
//! (no C-quoting) and may contain tabs or newlines.

use chrono::{DateTime, Utc};
use differing_types::{CommitId, CommitInfo, DiffStat, FileStatus};
use thiserror::Error;

/// `git log` format matching [`parse_log`]: hash, author, unix time, subject.
pub const LOG_FORMAT: &str = "--format=%H%x00%an%x00%at%x00%s";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparsable git output: {0}")]
pub struct ParseError(String);

/// One `--numstat` row. `lines` is `None` for binary files (`-\t-`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub path: String,
    pub lines: Option<(u64, u64)>,
}

/// The entry `git ls-tree` reports for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub object: String,
}

impl TreeEntry {
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

fn nul_fields(out: &[u8]) -> impl Iterator<Item = &[u8]> {
    out.split(|b| *b == 0).filter(|field| !field.is_empty())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse `git diff --numstat -z`.
pub fn parse_numstat(out: &[u8]) -> Result<Vec<NumstatEntry>, ParseError> {
    let mut fields = nul_fields(out);
    let mut entries = Vec::new();

    while let Some(record) = fields.next() {
        let record = String::from_utf8_lossy(record);
        let mut parts = record.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError(format!("numstat record {record:?}")));
        };

        // Rename records carry an empty path followed by the old and new names.
        let path = if path.is_empty() {
            let _old = fields.next();
            let new = fields
                .next()
                .ok_or_else(|| ParseError("numstat rename without target".to_string()))?;
            lossy(new)
        } else {
            path.to_string()
        };

        entries.push(NumstatEntry {
            path,
            lines: parse_counts(added, deleted)?,
        });
    }

    Ok(entries)
}

fn parse_counts(added: &str, deleted: &str) -> Result<Option<(u64, u64)>, ParseError> {
    if added == "-" && deleted == "-" {
        return Ok(None);
    }
    let parse = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| ParseError(format!("numstat count {s:?}")))
    };
    Ok(Some((parse(added)?, parse(deleted)?)))
}

#[must_use]
pub fn sum_numstat(entries: &[NumstatEntry]) -> DiffStat {
    let mut stat = DiffStat::default();
    for entry in entries {
        stat.add_file(entry.lines);
    }
    stat
}

/// Parse `git diff --name-status -z`.
pub fn parse_name_status(out: &[u8]) -> Result<Vec<(FileStatus, String)>, ParseError> {
    let mut fields = nul_fields(out);
    let mut entries = Vec::new();

    while let Some(status) = fields.next() {
        let status = String::from_utf8_lossy(status);
        let path = fields
            .next()
            .ok_or_else(|| ParseError(format!("name-status {status:?} without a path")))?;
        // Renames and copies list source then destination; the destination is what exists now.
        let path = if status.starts_with(['R', 'C']) {
            fields
                .next()
                .ok_or_else(|| ParseError(format!("name-status {status:?} without a target")))?
        } else {
            path
        };
        entries.push((FileStatus::from_git_letter(&status), lossy(path)));
    }

    Ok(entries)
}

/// Parse `git log` output produced with [`LOG_FORMAT`].
pub fn parse_log(out: &str) -> Result<Vec<CommitInfo>, ParseError> {
    out.lines()
        .filter(|line| !line.is_empty())
        .map(parse_log_line)
        .collect()
}

fn parse_log_line(line: &str) -> Result<CommitInfo, ParseError> {
    let mut parts = line.splitn(4, '\0');
    let (Some(id), Some(author), Some(time), Some(subject)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError(format!("log record {line:?}")));
    };

    let id = CommitId::new(id).map_err(|e| ParseError(format!("log commit id: {e}")))?;
    let secs = time
        .parse::<i64>()
        .map_err(|_| ParseError(format!("log timestamp {time:?}")))?;
    let timestamp: DateTime<Utc> = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ParseError(format!("log timestamp {secs} out of range")))?;

    Ok(CommitInfo {
        id,
        message: subject.to_string(),
        author: author.to_string(),
        timestamp,
    })
}

/// Parse one `git rev-list --parents` line into the commit and its parents.
pub fn parse_parents(out: &str) -> Result<(CommitId, Vec<CommitId>), ParseError> {
    let mut ids = out.split_whitespace().map(|s| {
        CommitId::new(s).map_err(|e| ParseError(format!("rev-list id {s:?}: {e}")))
    });
    let commit = ids
        .next()
        .ok_or_else(|| ParseError("empty rev-list output".to_string()))??;
    let parents = ids.collect::<Result<Vec<_>, _>>()?;
    Ok((commit, parents))
}

/// Parse `git ls-tree -z <tree> -- <path>` for a single path. Empty output means absent.
pub fn parse_ls_tree_entry(out: &[u8]) -> Result<Option<TreeEntry>, ParseError> {
    let Some(record) = nul_fields(out).next() else {
        return Ok(None);
    };
    let record = String::from_utf8_lossy(record);
    let (meta, _path) = record
        .split_once('\t')
        .ok_or_else(|| ParseError(format!("ls-tree record {record:?}")))?;
    let mut parts = meta.split(' ');
    let (Some(mode), Some(kind), Some(object)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError(format!("ls-tree record {record:?}")));
    };
    if object.is_empty() || !object.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError(format!("ls-tree object {object:?}")));
    }
    Ok(Some(TreeEntry {
        mode: mode.to_string(),
        kind: kind.to_string(),
        object: object.to_string(),
    }))
}

/// Split `git ls-files -z` output into paths.
#[must_use]
pub fn parse_path_list(out: &[u8]) -> Vec<String> {
    nul_fields(out).map(lossy).collect()
}
