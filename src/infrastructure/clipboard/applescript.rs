use super::{prime_clipboard, read_clipboard, ClipboardBridge, CLIPBOARD_SETTLE_DELAY};
use crate::domain::error::{AppError, Result};
use crate::domain::events::CaptureResult;
use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

// macOS exposes no synthetic key-injection path that works reliably across
// secure-input contexts, so the frontmost application is told to copy via
// out-of-process automation instead.
const KEYSTROKE_SCRIPT: &str = r#"
tell application "System Events"
  tell (name of application processes whose frontmost is true) as text
    keystroke "c" using {command down}
  end tell
end tell
"#;

// Second strategy: drive the frontmost application's Edit menu directly.
const EDIT_MENU_SCRIPT: &str = r#"
tell application "System Events"
  tell (first process whose frontmost is true)
    tell menu bar 1
      tell menu bar item "Edit"
        tell menu "Edit"
          click menu item "Copy"
        end tell
      end tell
    end tell
  end tell
end tell
"#;

pub struct AppleScriptBridge {
    app: tauri::AppHandle,
}

impl AppleScriptBridge {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

async fn run_osascript(script: &str) -> Result<()> {
    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .await
        .map_err(|e| AppError::Capture(format!("failed to run osascript: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Capture(stderr.trim().to_string()));
    }

    Ok(())
}

#[async_trait]
impl ClipboardBridge for AppleScriptBridge {
    async fn capture(&self) -> Result<CaptureResult> {
        prime_clipboard(&self.app);

        if let Err(err) = run_osascript(KEYSTROKE_SCRIPT).await {
            warn!(error = %err, "keystroke automation failed, driving the Edit menu");
            if let Err(err) = run_osascript(EDIT_MENU_SCRIPT).await {
                warn!(error = %err, "edit menu automation failed, reading clipboard as-is");
            }
        }

        tokio::time::sleep(CLIPBOARD_SETTLE_DELAY).await;

        Ok(CaptureResult {
            text: read_clipboard(&self.app).trim().to_string(),
            captured_at: Utc::now(),
        })
    }
}
