use super::{prime_clipboard, read_clipboard, ClipboardBridge, CLIPBOARD_SETTLE_DELAY};
use crate::domain::error::Result;
use crate::domain::events::CaptureResult;
use async_trait::async_trait;
use chrono::Utc;
use enigo::{Enigo, Key, KeyboardControllable};
use std::time::Duration;
use tracing::warn;

pub struct KeystrokeBridge {
    app: tauri::AppHandle,
}

impl KeystrokeBridge {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

// Releases any modifier the user still holds from the hotkey chord before
// pressing the copy shortcut; the inter-key sleeps keep slow applications
// from swallowing the sequence.
fn press_copy_shortcut() {
    let mut enigo = Enigo::new();

    #[cfg(target_os = "macos")]
    {
        enigo.key_up(Key::Option);
        enigo.key_up(Key::Meta);
        std::thread::sleep(Duration::from_millis(50));

        enigo.key_down(Key::Meta);
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_down(Key::Layout('c'));
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_up(Key::Layout('c'));
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_up(Key::Meta);
    }
    #[cfg(not(target_os = "macos"))]
    {
        enigo.key_up(Key::Alt);
        enigo.key_up(Key::Control);
        std::thread::sleep(Duration::from_millis(50));

        enigo.key_down(Key::Control);
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_down(Key::Layout('c'));
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_up(Key::Layout('c'));
        std::thread::sleep(Duration::from_millis(100));
        enigo.key_up(Key::Control);
    }

    let _ = enigo;
}

#[async_trait]
impl ClipboardBridge for KeystrokeBridge {
    async fn capture(&self) -> Result<CaptureResult> {
        prime_clipboard(&self.app);

        if let Err(err) = tokio::task::spawn_blocking(press_copy_shortcut).await {
            warn!(error = %err, "copy keystroke worker failed, reading clipboard as-is");
        }

        tokio::time::sleep(CLIPBOARD_SETTLE_DELAY).await;

        Ok(CaptureResult {
            text: read_clipboard(&self.app).trim().to_string(),
            captured_at: Utc::now(),
        })
    }
}
