//! Working-tree file access confined to the repository root.
//!
//! This is the second gate: callers are expected to have run path validation
//! already, but the handle re-checks every path on its own so a bug upstream
//! cannot turn into a read or write outside the checkout.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{PathRejection, RepoError};

/// A directory handle that refuses to resolve anything outside its root.
#[derive(Debug, Clone)]
pub struct RootedDir {
    root: PathBuf,
    max_read_bytes: usize,
}

impl RootedDir {
    pub fn new(root: &Path, max_read_bytes: usize) -> Result<Self, RepoError> {
        let root = std::fs::canonicalize(root)
            .map_err(|e| RepoError::io(root.display().to_string(), e))?;
        Ok(Self {
            root,
            max_read_bytes: max_read_bytes.max(1),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn max_read_bytes(&self) -> usize {
        self.max_read_bytes
    }

    /// Open an existing regular file for reading. `Ok(None)` if nothing is there.
    pub fn open_for_read(&self, rel: &str) -> Result<Option<File>, RepoError> {
        let Some(path) = self.resolve(rel)? else {
            return Ok(None);
        };
        let file = match no_follow().read(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::io(rel, e)),
        };
        ensure_regular(&file, rel)?;
        Ok(Some(file))
    }

    /// Open an existing regular file for writing. Never creates and never truncates;
    /// see [`RootedDir::write_existing`] for the replace-contents path.
    pub fn open_for_write(&self, rel: &str) -> Result<File, RepoError> {
        let Some(path) = self.resolve(rel)? else {
            return Err(RepoError::invalid_path(rel, PathRejection::Missing));
        };
        let file = no_follow()
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => RepoError::invalid_path(rel, PathRejection::Missing),
                _ => RepoError::io(rel, e),
            })?;
        ensure_regular(&file, rel)?;
        Ok(file)
    }

    /// Read a file as text (lossy for non-UTF-8 bytes). `Ok(None)` if it does not exist.
    pub fn read_to_string(&self, rel: &str) -> Result<Option<String>, RepoError> {
        let Some(file) = self.open_for_read(rel)? else {
            return Ok(None);
        };
        let too_large = || RepoError::TooLarge {
            path: rel.to_string(),
            limit: self.max_read_bytes,
        };

        let len = file.metadata().map_err(|e| RepoError::io(rel, e))?.len();
        if len > self.max_read_bytes as u64 {
            return Err(too_large());
        }

        let mut buf = Vec::with_capacity(len as usize);
        file.take(self.max_read_bytes as u64 + 1)
            .read_to_end(&mut buf)
            .map_err(|e| RepoError::io(rel, e))?;
        if buf.len() > self.max_read_bytes {
            return Err(too_large());
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Replace the contents of an existing file and flush it to disk.
    pub fn write_existing(&self, rel: &str, contents: &[u8]) -> Result<usize, RepoError> {
        let mut file = self.open_for_write(rel)?;
        file.set_len(0).map_err(|e| RepoError::io(rel, e))?;
        file.write_all(contents).map_err(|e| RepoError::io(rel, e))?;
        file.sync_all().map_err(|e| RepoError::io(rel, e))?;
        Ok(contents.len())
    }

    /// Resolve `rel` to a canonical path under the root. `Ok(None)` when it does not exist.
    ///
    /// The canonical path must be exactly `root/rel`: a symlink anywhere along the way is
    /// refused, even when it points back inside the checkout.
    fn resolve(&self, rel: &str) -> Result<Option<PathBuf>, RepoError> {
        let reject = |reason| RepoError::invalid_path(rel, reason);

        if rel.is_empty() {
            return Err(reject(PathRejection::Empty));
        }
        if contains_unsafe_path_chars(rel) {
            return Err(reject(PathRejection::UnsafeCharacters));
        }
        let mut lexical = self.root.clone();
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(name) => {
                    if name.eq_ignore_ascii_case(".git") {
                        return Err(reject(PathRejection::GitDir));
                    }
                    lexical.push(name);
                }
                Component::CurDir => {}
                Component::ParentDir => return Err(reject(PathRejection::EscapesRoot)),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(reject(PathRejection::Absolute));
                }
            }
        }
        if lexical == self.root {
            return Err(reject(PathRejection::NamesRoot));
        }

        match std::fs::symlink_metadata(&lexical) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Absent, but a symlinked parent directory could still point elsewhere.
                if let Some(parent) = lexical.parent()
                    && let Ok(parent_canon) = std::fs::canonicalize(parent)
                {
                    self.check_canonical(parent, parent_canon).map_err(reject)?;
                }
                return Ok(None);
            }
            Err(e) => return Err(RepoError::io(rel, e)),
        }

        // Follows symlinks; a dangling link has nothing we could safely open.
        let canonical = std::fs::canonicalize(&lexical).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => reject(PathRejection::NotAFile),
            _ => RepoError::io(rel, e),
        })?;
        let canonical = self.check_canonical(&lexical, canonical).map_err(reject)?;
        if !std::fs::metadata(&canonical).is_ok_and(|meta| meta.is_file()) {
            return Err(reject(PathRejection::NotAFile));
        }
        Ok(Some(canonical))
    }

    fn check_canonical(
        &self,
        lexical: &Path,
        canonical: PathBuf,
    ) -> Result<PathBuf, PathRejection> {
        if !canonical.starts_with(&self.root) {
            return Err(PathRejection::OutsideRoot {
                resolved: canonical,
            });
        }
        if canonical != lexical {
            return Err(PathRejection::Symlink {
                resolved: canonical,
            });
        }
        Ok(canonical)
    }
}

/// C0/C1 control characters and DEL never belong in a path we serve.
pub(crate) fn contains_unsafe_path_chars(input: &str) -> bool {
    input.chars().any(char::is_control)
}

fn no_follow() -> OpenOptions {
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW);
    }
    options
}

fn ensure_regular(file: &File, rel: &str) -> Result<(), RepoError> {
    let meta = file.metadata().map_err(|e| RepoError::io(rel, e))?;
    if meta.is_file() {
        Ok(())
    } else {
        Err(RepoError::invalid_path(rel, PathRejection::NotAFile))
    }
}
