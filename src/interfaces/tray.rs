use crate::domain::settings::HotkeyBinding;
use crate::interfaces::commands::AppContext;
use crate::interfaces::windows::WindowKind;
use std::sync::Arc;
use tauri::menu::{Menu, MenuBuilder, MenuItemBuilder};
use tauri::tray::{TrayIconBuilder, TrayIconEvent, TrayIconId};
use tauri::{AppHandle, Manager, Wry};
use tracing::warn;

const TRAY_ID: &str = "tray";

pub fn create(app: &AppHandle, active_shortcuts: &[String]) -> tauri::Result<()> {
    let menu = build_menu(app, active_shortcuts)?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .menu(&menu)
        .show_menu_on_left_click(true)
        .tooltip("Traylate")
        .on_menu_event(|app, event| handle_menu_event(app, event.id().as_ref()))
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::DoubleClick { .. } = event {
                run_pipeline(tray.app_handle());
            }
        });
    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }
    builder.build(app)?;

    Ok(())
}

/// Rebuilds the menu so the translate entry shows the shortcut that is
/// actually bound right now.
pub fn update_menu(app: &AppHandle, active_shortcuts: &[String]) -> tauri::Result<()> {
    if let Some(tray) = app.tray_by_id(&TrayIconId::new(TRAY_ID)) {
        tray.set_menu(Some(build_menu(app, active_shortcuts)?))?;
    }
    Ok(())
}

fn build_menu(app: &AppHandle, active_shortcuts: &[String]) -> tauri::Result<Menu<Wry>> {
    let shortcut_display = active_shortcuts
        .first()
        .cloned()
        .unwrap_or_else(|| HotkeyBinding::default_translate().display());

    let translate = MenuItemBuilder::with_id(
        "translate-selection",
        format!("Translate Selected Text ({})", shortcut_display),
    )
    .build(app)?;
    let translate_now = MenuItemBuilder::with_id("translate-now", "Translate Now").build(app)?;
    let settings = MenuItemBuilder::with_id("settings", "Settings").build(app)?;
    let about = MenuItemBuilder::with_id("about", "About").build(app)?;
    let quit = MenuItemBuilder::with_id("quit", "Quit").build(app)?;

    MenuBuilder::new(app)
        .item(&translate)
        .item(&translate_now)
        .separator()
        .item(&settings)
        .item(&about)
        .separator()
        .item(&quit)
        .build()
}

fn handle_menu_event(app: &AppHandle, id: &str) {
    let Some(ctx) = app.try_state::<Arc<AppContext>>() else {
        return;
    };
    let ctx = ctx.inner().clone();

    match id {
        "translate-selection" => run_pipeline(app),
        "translate-now" => open_window(&ctx, WindowKind::TranslateNow),
        "settings" => open_window(&ctx, WindowKind::Settings),
        "about" => open_window(&ctx, WindowKind::About),
        "quit" => {
            ctx.windows.set_quitting();
            ctx.windows.destroy_all();
            if let Err(err) = ctx.hotkeys.clear() {
                warn!(error = %err, "failed to unregister shortcuts on quit");
            }
            app.exit(0);
        }
        _ => {}
    }
}

fn open_window(ctx: &Arc<AppContext>, kind: WindowKind) {
    if let Err(err) = ctx.windows.open_or_reveal(kind) {
        warn!(window = kind.label(), error = %err, "failed to open window from tray");
    }
}

fn run_pipeline(app: &AppHandle) {
    let Some(ctx) = app.try_state::<Arc<AppContext>>() else {
        return;
    };
    let ctx = ctx.inner().clone();
    tauri::async_runtime::spawn(async move {
        ctx.orchestrator.run_capture_pipeline().await;
    });
}
