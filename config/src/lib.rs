//! Configuration loading for differing.
//!
//! ```toml
//! [server]
//! addr = "localhost"
//! port = 3844
//! open = false
//!
//! [git]
//! timeout_ms = 30000
//! max_output_bytes = 10000000
//!
//! [diffs]
//! max_commits = 20
//! ```
//!
//! Every key is optional; CLI flags override whatever the file sets.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3844;
pub const DEFAULT_GIT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_GIT_TIMEOUT_MS: u64 = 100;
pub const MAX_GIT_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10_000_000;
pub const MAX_OUTPUT_BYTES: usize = 200_000_000;
pub const DEFAULT_MAX_COMMITS: usize = 20;
pub const MAX_COMMITS: usize = 1_000;

/// Environment variable that points at an alternate config file.
pub const CONFIG_ENV_VAR: &str = "DIFFERING_CONFIG";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DifferingConfig {
    pub server: Option<ServerConfig>,
    pub git: Option<GitConfig>,
    pub diffs: Option<DiffsConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: Option<String>,
    pub port: Option<u16>,
    /// Launch the platform browser once the listener is bound.
    #[serde(default)]
    pub open: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Per-invocation timeout. Clamped to 100 ms..=300 s.
    pub timeout_ms: Option<u64>,
    /// Cap on captured stdout per invocation, and on working-tree reads.
    pub max_output_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffsConfig {
    /// How many recent commits the diff list shows after the working entry.
    pub max_commits: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl DifferingConfig {
    /// Load from the default location. `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        Self::parse(&content, path).map(Some)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, err);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.addr.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ADDR)
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    #[must_use]
    pub fn open_browser(&self) -> bool {
        self.server.as_ref().is_some_and(|s| s.open)
    }

    #[must_use]
    pub fn git_timeout(&self) -> Duration {
        let ms = self
            .git
            .as_ref()
            .and_then(|g| g.timeout_ms)
            .unwrap_or(DEFAULT_GIT_TIMEOUT_MS)
            .clamp(MIN_GIT_TIMEOUT_MS, MAX_GIT_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub fn max_output_bytes(&self) -> usize {
        self.git
            .as_ref()
            .and_then(|g| g.max_output_bytes)
            .unwrap_or(DEFAULT_MAX_OUTPUT_BYTES)
            .clamp(1, MAX_OUTPUT_BYTES)
    }

    #[must_use]
    pub fn max_commits(&self) -> usize {
        self.diffs
            .as_ref()
            .and_then(|d| d.max_commits)
            .unwrap_or(DEFAULT_MAX_COMMITS)
            .clamp(1, MAX_COMMITS)
    }
}

/// `$DIFFERING_CONFIG` if set, else `~/.differing/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".differing").join("config.toml"))
}
