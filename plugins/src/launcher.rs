//! Hands a file or URL to the desktop's default application.

use std::io;
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Program and arguments that open `target`. The target is always passed as
/// one argument and never through a shell.
#[cfg(target_os = "macos")]
pub fn opener(target: &str) -> (&'static str, Vec<String>) {
    ("open", vec![target.to_string()])
}

#[cfg(target_os = "windows")]
pub fn opener(target: &str) -> (&'static str, Vec<String>) {
    // `cmd /C start` would reparse `&` and `^` in URLs.
    (
        "rundll32",
        vec!["url.dll,FileProtocolHandler".to_string(), target.to_string()],
    )
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn opener(target: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![target.to_string()])
}

/// Starts `cmd` and reaps it in the background once it exits. Must be called
/// from within a tokio runtime.
pub fn spawn_detached(mut cmd: Command) -> io::Result<JoinHandle<()>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => debug!("Opener exited with {}", status),
            Ok(_) => {}
            Err(e) => warn!("Failed to wait for opener: {}", e),
        }
    }))
}

/// Starts the default handler for `target` without waiting for it.
pub fn open(target: &str) -> io::Result<()> {
    debug!("Opening {}", target);
    let (program, args) = opener(target);
    let mut cmd = Command::new(program);
    cmd.args(&args);
    spawn_detached(cmd)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_a_single_argument() {
        let url = "https://www.google.com/search?q=a&b=c^d";
        let (_, args) = opener(url);
        assert_eq!(args.last().map(String::as_str), Some(url));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawned_child_is_reaped() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);

        let reaper = spawn_detached(cmd).unwrap();
        // Completes only after the child has been waited on.
        tokio::time::timeout(std::time::Duration::from_secs(5), reaper)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let cmd = Command::new("definitely-not-an-opener-program");
        assert!(spawn_detached(cmd).is_err());
    }
}
