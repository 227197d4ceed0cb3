//! Full-screen captures saved under `[screenshots] folder`, taken with the
//! platform's capture tool (`scrot` on Linux, `screencapture` on macOS,
//! .NET on Windows).

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use shared::config::ConfigStore;
use shared::handler::{CommandArgs, Handler, HandlerResult};
use shared::plugin::{Plugin, PluginContext, Registration};
use shared::speech::Speak;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenshotSettings {
    #[serde(default)]
    pub folder: String,
}

pub struct ScreenshotPlugin;

impl Plugin for ScreenshotPlugin {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn register(&self, ctx: &PluginContext) -> Registration {
        let handler = ScreenshotHandler {
            config: Arc::clone(&ctx.config),
            speaker: Arc::clone(&ctx.speaker),
        };
        Registration::new().with(&["screenshot", "capture", "screen"], Arc::new(handler))
    }
}

pub struct ScreenshotHandler {
    config: Arc<ConfigStore>,
    speaker: Arc<dyn Speak>,
}

#[async_trait]
impl Handler for ScreenshotHandler {
    async fn handle(&self, _args: CommandArgs) -> HandlerResult {
        let settings: ScreenshotSettings = self.config.snapshot().section("screenshots");
        if settings.folder.is_empty() {
            return Ok("No screenshot folder configured.".to_string());
        }

        let folder = Path::new(&settings.folder);
        tokio::fs::create_dir_all(folder).await?;

        let filename = file_name(Local::now().naive_local());
        let path = folder.join(&filename);
        let path_str = path.to_string_lossy().into_owned();

        if let Err(e) = capture(&path_str).await {
            return Ok(format!("Error saving screenshot: {}", e));
        }

        self.speaker
            .speak(&format!("Screenshot saved as {}", filename))
            .await;
        Ok(format!("Screenshot saved to {}", path_str))
    }
}

pub fn file_name(at: NaiveDateTime) -> String {
    format!("screenshot_{}.png", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(target_os = "macos")]
fn capture_command(path: &str) -> Command {
    let mut cmd = Command::new("screencapture");
    cmd.args(["-x", path]);
    cmd
}

#[cfg(target_os = "windows")]
fn capture_command(path: &str) -> Command {
    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
         $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
         $img = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
         $g = [System.Drawing.Graphics]::FromImage($img); \
         $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $img.Size); \
         $img.Save('{}')",
        path.replace('\'', "''")
    );
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-Command", &script]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn capture_command(path: &str) -> Command {
    let mut cmd = Command::new("scrot");
    cmd.args(["--overwrite", path]);
    cmd
}

async fn capture(path: &str) -> anyhow::Result<()> {
    debug!("Capturing screen to {}", path);
    let output = capture_command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run capture tool: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!(
            "Capture tool exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    Ok(())
}
