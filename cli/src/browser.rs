use std::time::Duration;

use tokio::process::Command;

/// Give the listener a moment before the browser's first request.
const OPEN_DELAY: Duration = Duration::from_millis(500);

/// Launch the platform's URL opener in the background. Failures are only logged.
pub fn open_after_delay(url: String) {
    tokio::spawn(async move {
        tokio::time::sleep(OPEN_DELAY).await;
        let Some(mut cmd) = opener(&url) else {
            println!("Unable to open browser on this platform");
            return;
        };
        if let Err(err) = cmd.spawn() {
            tracing::warn!(url = %url, error = %err, "failed to open browser");
        }
    });
}

fn opener(url: &str) -> Option<Command> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/c", "start", ""]);
        cmd
    } else if cfg!(unix) {
        Command::new("xdg-open")
    } else {
        return None;
    };
    cmd.arg(url);
    Some(cmd)
}
