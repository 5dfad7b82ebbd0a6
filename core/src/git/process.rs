//! Child-process lifetime management for git invocations.

use tokio::process::Child;

/// RAII guard that kills a child process (and its process group on Unix) on drop.
///
/// Wrap a spawned child immediately after `spawn()` so that a cancelled request
/// future cannot leak a running git. Call `disarm()` once the process has exited.
pub struct ChildGuard {
    child: Child,
    armed: bool,
}

impl ChildGuard {
    #[must_use]
    pub fn new(child: Child) -> Self {
        Self { child, armed: true }
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Kill the whole process group now, leaving the guard armed for reaping.
    pub fn kill_group(&mut self) {
        kill_tree(&mut self.child);
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        kill_tree(&mut self.child);
        let _ = self.child.try_wait();
    }
}

fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: killpg has no memory-safety preconditions; a stale pid only yields ESRCH.
            let rc = unsafe { libc::killpg(pid as i32, libc::SIGKILL) };
            if rc == -1 {
                let _ = child.start_kill();
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }
}

/// Put the child in its own session so `kill_tree` reaches any helpers git forks.
#[cfg(unix)]
pub fn set_new_session(cmd: &mut tokio::process::Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: only async-signal-safe calls run between fork and exec.
    unsafe {
        cmd.as_std_mut().pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            // Linux-only: git dies with us if the server is killed outright.
            #[cfg(target_os = "linux")]
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}
