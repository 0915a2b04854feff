use std::sync::Arc;

use crate::application::use_cases::pipeline::TranslationOrchestrator;
use crate::application::use_cases::translate::TranslateUseCase;
use crate::application::use_cases::vocabulary::VocabularyUseCase;
use crate::infrastructure::clipboard;
use crate::infrastructure::config::SettingsStore;
use crate::infrastructure::crash;
use crate::infrastructure::llm_clients::{ChatClient, RouterClient};
use crate::interfaces::commands::{self, AppContext};
use crate::interfaces::shortcuts::{HotkeyRegistry, ShortcutBackend, TauriShortcutBackend};
use crate::interfaces::tray;
use crate::interfaces::watchdog;
use crate::interfaces::windows::{
    CloseDisposition, TauriWindowBackend, WindowBackend, WindowKind, WindowLifecycleManager,
};
use tauri::webview::PageLoadEvent;
use tauri::Manager;
use tauri_plugin_autostart::MacosLauncher;
use tracing::warn;

pub fn run() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    crash::install();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            None,
        ))
        .setup(|app| setup(app))
        .invoke_handler(tauri::generate_handler![
            commands::get_settings,
            commands::save_settings,
            commands::translate_selection,
            commands::translate_direct,
            commands::open_window,
            commands::hide_window,
            commands::resize_window,
            commands::set_always_on_top,
            commands::open_external,
            commands::quit_app
        ])
        .on_page_load(|webview, payload| {
            if !matches!(payload.event(), PageLoadEvent::Finished) {
                return;
            }
            let Some(kind) = WindowKind::from_label(webview.label()) else {
                return;
            };
            if let Some(ctx) = webview.app_handle().try_state::<Arc<AppContext>>() {
                let settings = ctx.settings.get();
                if let Err(err) = ctx.windows.mark_loaded(kind, &settings) {
                    warn!(window = kind.label(), error = %err, "failed to push state to loaded window");
                }
            }
        })
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { api, .. } = event {
                let Some(kind) = WindowKind::from_label(window.label()) else {
                    return;
                };
                let app_handle = window.app_handle();
                if let Some(ctx) = app_handle.try_state::<Arc<AppContext>>() {
                    if ctx.windows.handle_close_requested(kind) == CloseDisposition::Hide {
                        api.prevent_close();
                    }
                }
            }
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

fn setup(app: &mut tauri::App) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app_handle = app.handle().clone();

    crash::set_app_handle(app_handle.clone());

    let app_data_dir = app_handle.path().app_data_dir()?;

    let settings = Arc::new(SettingsStore::new(app_data_dir));
    let window_backend: Arc<dyn WindowBackend> =
        Arc::new(TauriWindowBackend::new(app_handle.clone()));
    let windows = Arc::new(WindowLifecycleManager::new(window_backend));

    let client: Arc<dyn ChatClient> = Arc::new(RouterClient::new());
    let orchestrator = Arc::new(TranslationOrchestrator::new(
        clipboard::platform_bridge(app_handle.clone()),
        windows.clone(),
        TranslateUseCase::new(client.clone()),
        VocabularyUseCase::new(client),
        settings.clone(),
    ));

    let shortcut_backend: Arc<dyn ShortcutBackend> =
        Arc::new(TauriShortcutBackend::new(app_handle.clone()));
    let hotkeys = HotkeyRegistry::new(shortcut_backend);

    let ctx = Arc::new(AppContext {
        settings: settings.clone(),
        windows: windows.clone(),
        hotkeys,
        orchestrator,
        active_shortcuts: std::sync::Mutex::new(Vec::new()),
    });
    app_handle.manage(ctx.clone());

    // Trigger handlers resolve the context from managed state, so
    // registration has to come after manage().
    let registered = commands::refresh_shortcuts(&ctx);

    commands::apply_autostart(&app_handle, settings.get().run_at_startup);
    tray::create(&app_handle, &registered)?;
    watchdog::spawn(windows);

    Ok(())
}
