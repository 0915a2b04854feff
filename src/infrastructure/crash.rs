use crate::domain::events::PopupEvent;
use crate::interfaces::commands::AppContext;
use crate::interfaces::windows::WindowKind;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::System;
use tauri::Manager;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use uuid::Uuid;

static APP_HANDLE: OnceCell<tauri::AppHandle> = OnceCell::new();

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultReport {
    pub message: String,
    pub location: String,
    pub platform: String,
    pub arch: String,
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub cpu_count: usize,
    pub reported_at: DateTime<Utc>,
}

/// Installs the last-resort panic handler. Called once, before the Tauri
/// builder runs; the app handle arrives later via `set_app_handle`, so a
/// fault during early startup still produces a report in the temp directory.
pub fn install() {
    std::panic::set_hook(Box::new(|info| {
        let report = build_report(info);

        let log_path = match write_report(&report) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("failed to write crash report: {}", err);
                None
            }
        };

        eprintln!(
            "traylate crashed: {} ({})",
            report.message,
            log_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "report not written".to_string())
        );

        surface_failure_window(&report, log_path.as_deref());
    }));
}

pub fn set_app_handle(app: tauri::AppHandle) {
    let _ = APP_HANDLE.set(app);
}

fn build_report(info: &std::panic::PanicHookInfo<'_>) -> FaultReport {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "unknown".to_string());

    let sys = System::new_all();

    FaultReport {
        message,
        location,
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        total_memory_bytes: sys.total_memory(),
        used_memory_bytes: sys.used_memory(),
        cpu_count: sys.cpus().len(),
        reported_at: Utc::now(),
    }
}

fn primary_report_dir() -> Option<PathBuf> {
    let app = APP_HANDLE.get()?;
    app.path()
        .app_data_dir()
        .ok()
        .map(|dir| dir.join("crash"))
}

fn write_report(report: &FaultReport) -> std::io::Result<PathBuf> {
    let fallback = std::env::temp_dir().join("traylate-crash");
    match primary_report_dir() {
        Some(primary) => write_report_to(&primary, &fallback, report),
        None => write_report_to(&fallback, &fallback, report),
    }
}

/// Writes into `primary`, falling back to `fallback` when the primary
/// location is unwritable.
pub(crate) fn write_report_to(
    primary: &Path,
    fallback: &Path,
    report: &FaultReport,
) -> std::io::Result<PathBuf> {
    let file_name = format!("crash-{}.json", Uuid::new_v4());
    let contents = serde_json::to_string_pretty(report).unwrap_or_else(|_| format!("{:?}", report));

    match write_into(primary, &file_name, &contents) {
        Ok(path) => Ok(path),
        Err(_) => write_into(fallback, &file_name, &contents),
    }
}

fn write_into(dir: &Path, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Best-effort: reveal the crash window if the UI is still alive, otherwise
/// fall back to a native dialog. Any failure here ends at stderr.
fn surface_failure_window(report: &FaultReport, log_path: Option<&Path>) {
    let Some(app) = APP_HANDLE.get() else {
        return;
    };

    let log_path = log_path.map(|p| p.display().to_string());

    if let Some(ctx) = app.try_state::<Arc<AppContext>>() {
        let shown = ctx
            .windows
            .open_or_reveal(WindowKind::Crash)
            .and_then(|_| {
                ctx.windows.emit(
                    WindowKind::Crash,
                    &PopupEvent::CrashReport {
                        message: report.message.clone(),
                        log_path: log_path.clone(),
                    },
                )
            });
        if shown.is_ok() {
            return;
        }
    }

    let body = match &log_path {
        Some(path) => format!("{}\n\nA report was written to:\n{}", report.message, path),
        None => report.message.clone(),
    };
    app.dialog()
        .message(body)
        .kind(MessageDialogKind::Error)
        .title("Traylate crashed")
        .show(|_| {});
}
