use crate::application::use_cases::pipeline::TranslationOrchestrator;
use crate::domain::error::Result;
use crate::domain::settings::Settings;
use crate::infrastructure::config::SettingsStore;
use crate::interfaces::shortcuts::HotkeyRegistry;
use crate::interfaces::windows::{WindowKind, WindowLifecycleManager};
use std::sync::{Arc, Mutex};
use tauri::State;
use tauri_plugin_autostart::ManagerExt;
use tauri_plugin_opener::OpenerExt;
use tracing::warn;

/// The single owned application context. Built once in setup, shared with
/// every component through managed state; nothing here is an ambient global.
pub struct AppContext {
    pub settings: Arc<SettingsStore>,
    pub windows: Arc<WindowLifecycleManager>,
    pub hotkeys: HotkeyRegistry,
    pub orchestrator: Arc<TranslationOrchestrator>,
    pub active_shortcuts: Mutex<Vec<String>>,
}

/// Clears and rebuilds the full shortcut set from the current settings.
pub fn refresh_shortcuts(ctx: &AppContext) -> Vec<String> {
    let settings = ctx.settings.get();
    let registered = ctx.hotkeys.register(
        &settings.keyboard_shortcut,
        Some(&settings.language_tools_shortcut),
    );
    *ctx.active_shortcuts.lock().unwrap() = registered.clone();
    registered
}

pub(crate) fn apply_autostart(app: &tauri::AppHandle, enabled: bool) {
    let autolaunch = app.autolaunch();
    let result = if enabled {
        autolaunch.enable()
    } else {
        autolaunch.disable()
    };
    if let Err(err) = result {
        warn!(enabled, error = %err, "failed to update autostart registration");
    }
}

#[tauri::command]
pub async fn get_settings(state: State<'_, Arc<AppContext>>) -> Result<Settings> {
    Ok(state.settings.get())
}

/// Persists a partial settings update, then re-applies everything derived
/// from the document: shortcut registrations, the tray label, theme, and
/// the autostart entry.
#[tauri::command]
pub async fn save_settings(
    app: tauri::AppHandle,
    state: State<'_, Arc<AppContext>>,
    partial: serde_json::Value,
) -> Result<Settings> {
    let ctx = state.inner();
    let updated = ctx.settings.set(partial)?;

    let registered = refresh_shortcuts(ctx);
    if let Err(err) = crate::interfaces::tray::update_menu(&app, &registered) {
        warn!(error = %err, "failed to refresh tray menu");
    }

    ctx.windows.apply_dark_mode(updated.dark_mode);
    apply_autostart(&app, updated.run_at_startup);

    Ok(updated)
}

#[tauri::command]
pub async fn translate_selection(state: State<'_, Arc<AppContext>>) -> Result<()> {
    let ctx = state.inner().clone();
    tauri::async_runtime::spawn(async move {
        ctx.orchestrator.run_capture_pipeline().await;
    });
    Ok(())
}

#[tauri::command]
pub async fn translate_direct(
    state: State<'_, Arc<AppContext>>,
    text: String,
    target_language: Option<String>,
) -> Result<()> {
    let ctx = state.inner().clone();
    tauri::async_runtime::spawn(async move {
        ctx.orchestrator
            .run_direct_translation(text, target_language)
            .await;
    });
    Ok(())
}

#[tauri::command]
pub async fn open_window(state: State<'_, Arc<AppContext>>, kind: WindowKind) -> Result<()> {
    state.windows.open_or_reveal(kind).map(|_| ())
}

#[tauri::command]
pub async fn hide_window(state: State<'_, Arc<AppContext>>, kind: WindowKind) -> Result<()> {
    state.windows.hide(kind)
}

#[tauri::command]
pub async fn resize_window(state: State<'_, Arc<AppContext>>, content_height: f64) -> Result<()> {
    let height = (content_height + 150.0).clamp(500.0, 700.0);
    state.windows.resize(WindowKind::Translation, height)
}

#[tauri::command]
pub async fn set_always_on_top(state: State<'_, Arc<AppContext>>, on_top: bool) -> Result<()> {
    state
        .windows
        .set_always_on_top(WindowKind::Translation, on_top)
}

#[tauri::command]
pub async fn open_external(app: tauri::AppHandle, url: String) -> Result<()> {
    if let Err(err) = app.opener().open_url(url, None::<&str>) {
        warn!(error = %err, "failed to open external link");
    }
    Ok(())
}

#[tauri::command]
pub async fn quit_app(app: tauri::AppHandle, state: State<'_, Arc<AppContext>>) -> Result<()> {
    let ctx = state.inner();
    ctx.windows.set_quitting();
    ctx.windows.destroy_all();
    if let Err(err) = ctx.hotkeys.clear() {
        warn!(error = %err, "failed to unregister shortcuts on quit");
    }
    app.exit(0);
    Ok(())
}
