//! Hardened git subprocess execution and output parsing.

pub mod parse;
pub mod process;
mod runner;

pub use runner::{GitOutput, GitRunner};
pub(crate) use runner::{describe, failure_detail};
