use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time;

use super::process::ChildGuard;
use crate::error::RepoError;

const MAX_STDERR_BYTES: usize = 64 * 1024;
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Spawns git with hardening flags, a deadline and an output cap.
///
/// Every invocation gets `--no-pager`, `--literal-pathspecs`, colour and path
/// quoting disabled, and hooks pointed at an empty location. Diff-producing
/// subcommands additionally get `--no-ext-diff --no-textconv` so repository
/// config cannot make us run external programs.
#[derive(Debug, Clone)]
pub struct GitRunner {
    git_bin: PathBuf,
    timeout: Duration,
    max_stdout_bytes: usize,
}

/// Raw result of one git invocation.
#[derive(Debug)]
pub struct GitOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub truncated_stdout: bool,
}

impl GitOutput {
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl GitRunner {
    /// Find `git` on `PATH`.
    pub fn locate(timeout: Duration, max_stdout_bytes: usize) -> Result<Self, RepoError> {
        let bare_name = if cfg!(windows) { "git.exe" } else { "git" };
        let git_bin = which::which(bare_name)
            .map_err(|_| RepoError::git("lookup", format!("{bare_name} not found in PATH")))?;
        Ok(Self::with_binary(git_bin, timeout, max_stdout_bytes))
    }

    #[must_use]
    pub fn with_binary(git_bin: PathBuf, timeout: Duration, max_stdout_bytes: usize) -> Self {
        Self {
            git_bin,
            timeout,
            max_stdout_bytes: max_stdout_bytes.max(1),
        }
    }

    #[must_use]
    pub fn git_bin(&self) -> &Path {
        &self.git_bin
    }

    /// Run git in `dir` and report what happened without judging the exit status.
    ///
    /// Only spawn failures and timeouts are errors here.
    pub async fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput, RepoError> {
        let command = describe(args);
        let full_args = hardened_args(args);

        let mut cmd = Command::new(&self.git_bin);
        cmd.args(&full_args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("LC_ALL", "C");

        #[cfg(unix)]
        super::process::set_new_session(&mut cmd);

        let started = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| RepoError::git(&command, format!("failed to spawn git: {e}")))?;
        let mut guard = ChildGuard::new(child);

        let stdout = guard
            .child_mut()
            .stdout
            .take()
            .ok_or_else(|| RepoError::git(&command, "failed to capture git stdout"))?;
        let stderr = guard
            .child_mut()
            .stderr
            .take()
            .ok_or_else(|| RepoError::git(&command, "failed to capture git stderr"))?;

        let stdout_task = tokio::spawn(read_to_end_limited(stdout, self.max_stdout_bytes));
        let stderr_task = tokio::spawn(read_to_end_limited(stderr, MAX_STDERR_BYTES));

        let status = match time::timeout(self.timeout, guard.child_mut().wait()).await {
            Ok(res) => res.map_err(|e| RepoError::git(&command, e.to_string()))?,
            Err(_) => {
                guard.kill_group();
                if time::timeout(KILL_GRACE, guard.child_mut().wait())
                    .await
                    .is_ok_and(|res| res.is_ok())
                {
                    guard.disarm();
                }
                tracing::warn!(
                    command = %command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "git timed out"
                );
                return Err(RepoError::GitTimeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };
        guard.disarm();

        let (stdout_bytes, truncated_stdout) =
            stdout_task.await.unwrap_or_else(|_| (Vec::new(), false));
        let (stderr_bytes, _) = stderr_task.await.unwrap_or_else(|_| (Vec::new(), false));

        tracing::debug!(
            command = %command,
            exit_code = ?status.code(),
            stdout_bytes = stdout_bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "git finished"
        );

        Ok(GitOutput {
            exit_code: status.code(),
            success: status.success(),
            stdout: stdout_bytes,
            stderr: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
            truncated_stdout,
        })
    }

    /// Run git and require a zero exit with complete stdout.
    pub async fn output(&self, dir: &Path, args: &[&str]) -> Result<Vec<u8>, RepoError> {
        let out = self.run(dir, args).await?;
        if !out.success {
            return Err(RepoError::git(describe(args), failure_detail(&out)));
        }
        if out.truncated_stdout {
            return Err(RepoError::git(
                describe(args),
                format!("output exceeded {} bytes", self.max_stdout_bytes),
            ));
        }
        Ok(out.stdout)
    }

    /// [`GitRunner::output`], decoded lossily as UTF-8.
    pub async fn text(&self, dir: &Path, args: &[&str]) -> Result<String, RepoError> {
        self.output(dir, args)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub(crate) fn failure_detail(out: &GitOutput) -> String {
    if out.stderr.is_empty() {
        match out.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    } else {
        out.stderr.clone()
    }
}

/// Subcommand plus its flags, for logs and error messages. Operands are left out.
pub(crate) fn describe(args: &[&str]) -> String {
    let mut parts = args.iter().take(1).copied().collect::<Vec<_>>();
    parts.extend(args.iter().skip(1).copied().filter(|a| a.starts_with('-')));
    parts.join(" ")
}

fn hardened_args(subcommand_args: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-pager".into(),
        "--literal-pathspecs".into(),
        "-c".into(),
        "color.ui=false".into(),
        "-c".into(),
        "core.quotePath=false".into(),
        "-c".into(),
        format!("core.hooksPath={}", hooks_disabled_path()),
    ];

    let Some((subcmd, rest)) = subcommand_args.split_first() else {
        return args;
    };
    args.push((*subcmd).to_string());
    if matches!(*subcmd, "diff" | "show" | "log") {
        args.extend(["--no-ext-diff".into(), "--no-textconv".into()]);
    }
    args.extend(rest.iter().map(|a| (*a).to_string()));
    args
}

fn hooks_disabled_path() -> &'static str {
    static PATH: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    PATH.get_or_init(|| {
        #[cfg(unix)]
        {
            "/dev/null".to_string()
        }
        #[cfg(not(unix))]
        {
            let unique = {
                use std::hash::{BuildHasher, Hasher};
                let mut hasher = std::hash::RandomState::new().build_hasher();
                hasher.write_u32(std::process::id());
                hasher.finish()
            };
            let path = std::env::temp_dir().join(format!("differing-hooks-{unique:016x}"));
            let _ = std::fs::create_dir_all(&path);
            path.display().to_string()
        }
    })
}

/// Read up to `max_bytes`, then keep draining so the child never blocks on a full pipe.
async fn read_to_end_limited<R: AsyncRead + Unpin>(
    mut reader: R,
    max_bytes: usize,
) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let mut truncated = false;

    loop {
        let n = match reader.read(&mut tmp).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let remaining = max_bytes.saturating_sub(buf.len());
        let take = remaining.min(n);
        buf.extend_from_slice(&tmp[..take]);
        if take < n {
            truncated = true;
        }
    }

    (buf, truncated)
}
