//! Repository access and diff computation for differing.
//!
//! [`RepoService`] owns the resolved repository root, a [`RootedDir`] confined to
//! it, and a [`GitRunner`]. Every operation the HTTP layer exposes is a method on
//! it. `git` itself is treated as the authority on repository state; this crate
//! only builds safe argument lists and parses what comes back.

mod amend;
mod content;
mod diffs;
mod error;
mod files;
pub mod git;
mod revision;
mod root;
mod rooted;
mod service;
mod validate;

pub use amend::FORCE_PUSH_WARNING;
pub use error::{PathRejection, RepoError};
pub use git::{GitOutput, GitRunner};
pub use revision::Base;
pub use root::RepositoryRoot;
pub use rooted::RootedDir;
pub use service::{RepoService, RepoSettings};
pub use validate::{RepoPath, is_contained};
