pub mod applescript;
pub mod keystroke;

use crate::domain::error::Result;
use crate::domain::events::CaptureResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tauri_plugin_clipboard_manager::ClipboardExt;

pub use applescript::AppleScriptBridge;
pub use keystroke::KeystrokeBridge;

/// The copy command is asynchronous relative to the call that issues it;
/// the clipboard is only read after this settle delay has elapsed.
pub const CLIPBOARD_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Captures the text currently selected anywhere on the OS by driving the
/// foreground application's copy command and then reading the clipboard.
/// An empty result means "nothing to translate", never an error; prior
/// clipboard contents are not restored.
#[async_trait]
pub trait ClipboardBridge: Send + Sync {
    async fn capture(&self) -> Result<CaptureResult>;
}

/// Selects the capture strategy once at startup.
pub fn platform_bridge(app: tauri::AppHandle) -> Arc<dyn ClipboardBridge> {
    if cfg!(target_os = "macos") {
        Arc::new(AppleScriptBridge::new(app))
    } else {
        Arc::new(KeystrokeBridge::new(app))
    }
}

/// A read failure degrades to an empty string rather than propagating.
pub(crate) fn read_clipboard(app: &tauri::AppHandle) -> String {
    app.clipboard().read_text().unwrap_or_default()
}

/// Priming the clipboard with an empty string keeps a stale entry from
/// masquerading as a fresh capture when the copy command produces nothing.
pub(crate) fn prime_clipboard(app: &tauri::AppHandle) {
    let _ = app.clipboard().write_text("");
}
