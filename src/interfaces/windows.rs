use crate::domain::error::{AppError, Result};
use crate::domain::events::PopupEvent;
use crate::domain::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tauri::{Emitter, Manager};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowKind {
    Translation,
    Settings,
    About,
    TranslateNow,
    Crash,
}

impl WindowKind {
    pub fn label(self) -> &'static str {
        match self {
            WindowKind::Translation => "translation",
            WindowKind::Settings => "settings",
            WindowKind::About => "about",
            WindowKind::TranslateNow => "translate-now",
            WindowKind::Crash => "crash",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WindowKind::Translation => "Translation",
            WindowKind::Settings => "Traylate Settings",
            WindowKind::About => "About Traylate",
            WindowKind::TranslateNow => "Translate Now",
            WindowKind::Crash => "Traylate Crash Report",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "translation" => Some(WindowKind::Translation),
            "settings" => Some(WindowKind::Settings),
            "about" => Some(WindowKind::About),
            "translate-now" => Some(WindowKind::TranslateNow),
            "crash" => Some(WindowKind::Crash),
            _ => None,
        }
    }
}

/// One native window as seen by the backend census, identified by label
/// with the title carried for duplicate detection.
#[derive(Debug, Clone)]
pub struct OpenWindow {
    pub label: String,
    pub title: String,
}

/// The native window operations the lifecycle state machine needs. One
/// implementation drives Tauri webview windows; tests substitute a fake.
pub trait WindowBackend: Send + Sync {
    fn build(&self, kind: WindowKind) -> Result<()>;
    fn show(&self, kind: WindowKind) -> Result<()>;
    fn hide(&self, kind: WindowKind) -> Result<()>;
    fn focus(&self, kind: WindowKind) -> Result<()>;
    fn destroy(&self, kind: WindowKind) -> Result<()>;
    fn exists(&self, kind: WindowKind) -> bool;
    fn emit(&self, kind: WindowKind, event: &PopupEvent) -> Result<()>;
    fn resize(&self, kind: WindowKind, height: f64) -> Result<()>;
    fn set_always_on_top(&self, kind: WindowKind, on_top: bool) -> Result<()>;
    fn list_open(&self) -> Vec<OpenWindow>;
    fn close_label(&self, label: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Hidden,
    Visible,
}

struct Slot {
    state: SlotState,
    loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    Hide,
    Destroy,
}

enum RevealAction {
    Build,
    Show,
    Focus,
}

/// Owns the singleton instance of each popup window type. Popups are
/// expensive to recreate (content reload, settings re-push), so a user close
/// hides the window; destruction happens only at quit or after a failed
/// construction.
pub struct WindowLifecycleManager {
    backend: Arc<dyn WindowBackend>,
    slots: Mutex<HashMap<WindowKind, Slot>>,
    quitting: AtomicBool,
}

impl WindowLifecycleManager {
    pub fn new(backend: Arc<dyn WindowBackend>) -> Self {
        Self {
            backend,
            slots: Mutex::new(HashMap::new()),
            quitting: AtomicBool::new(false),
        }
    }

    /// Returns `true` when a new instance was constructed; callers use that
    /// to wait out the first content load before pushing events.
    pub fn open_or_reveal(&self, kind: WindowKind) -> Result<bool> {
        let action = {
            let slots = self.slots.lock().unwrap();
            match slots.get(&kind) {
                None => RevealAction::Build,
                Some(slot) if slot.state == SlotState::Hidden => RevealAction::Show,
                Some(_) => RevealAction::Focus,
            }
        };

        match action {
            RevealAction::Build => {
                if let Err(err) = self.backend.build(kind) {
                    // Tear down so a retry reconstructs from scratch.
                    let _ = self.backend.destroy(kind);
                    self.slots.lock().unwrap().remove(&kind);
                    return Err(err);
                }
                self.slots.lock().unwrap().insert(
                    kind,
                    Slot {
                        state: SlotState::Visible,
                        loaded: false,
                    },
                );
                Ok(true)
            }
            RevealAction::Show => {
                self.backend.show(kind)?;
                if let Some(slot) = self.slots.lock().unwrap().get_mut(&kind) {
                    slot.state = SlotState::Visible;
                }
                Ok(false)
            }
            RevealAction::Focus => {
                self.backend.focus(kind)?;
                Ok(false)
            }
        }
    }

    /// A user close hides the window unless the process is quitting, in
    /// which case the window may actually be destroyed.
    pub fn handle_close_requested(&self, kind: WindowKind) -> CloseDisposition {
        if self.quitting.load(Ordering::SeqCst) {
            self.slots.lock().unwrap().remove(&kind);
            let _ = self.backend.destroy(kind);
            return CloseDisposition::Destroy;
        }

        if let Some(slot) = self.slots.lock().unwrap().get_mut(&kind) {
            slot.state = SlotState::Hidden;
        }
        if let Err(err) = self.backend.hide(kind) {
            warn!(window = kind.label(), error = %err, "failed to hide window on close request");
        }
        CloseDisposition::Hide
    }

    pub fn hide(&self, kind: WindowKind) -> Result<()> {
        let mut slots = self.slots.lock().unwrap();
        let Some(slot) = slots.get_mut(&kind) else {
            return Ok(());
        };
        slot.state = SlotState::Hidden;
        drop(slots);
        self.backend.hide(kind)
    }

    /// Pushes theme state (and, for the multi-tool window, the settings
    /// document) exactly once per instance, on its first content-loaded
    /// signal. Emitting earlier would race the popup's own initialization.
    pub fn mark_loaded(&self, kind: WindowKind, settings: &Settings) -> Result<()> {
        {
            let mut slots = self.slots.lock().unwrap();
            let Some(slot) = slots.get_mut(&kind) else {
                return Ok(());
            };
            if slot.loaded {
                return Ok(());
            }
            slot.loaded = true;
        }

        self.backend.emit(
            kind,
            &PopupEvent::SetDarkMode {
                enabled: settings.dark_mode,
            },
        )?;
        if kind == WindowKind::TranslateNow {
            self.backend.emit(
                kind,
                &PopupEvent::LoadSettings {
                    settings: settings.clone(),
                },
            )?;
        }
        Ok(())
    }

    pub fn emit(&self, kind: WindowKind, event: &PopupEvent) -> Result<()> {
        self.backend.emit(kind, event)
    }

    pub fn apply_dark_mode(&self, enabled: bool) {
        let kinds: Vec<WindowKind> = self.slots.lock().unwrap().keys().copied().collect();
        for kind in kinds {
            if let Err(err) = self
                .backend
                .emit(kind, &PopupEvent::SetDarkMode { enabled })
            {
                warn!(window = kind.label(), error = %err, "failed to push dark mode");
            }
        }
    }

    pub fn resize(&self, kind: WindowKind, height: f64) -> Result<()> {
        self.backend.resize(kind, height)
    }

    pub fn set_always_on_top(&self, kind: WindowKind, on_top: bool) -> Result<()> {
        self.backend.set_always_on_top(kind, on_top)
    }

    pub fn set_quitting(&self) {
        self.quitting.store(true, Ordering::SeqCst);
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }

    pub fn destroy_all(&self) {
        let kinds: Vec<WindowKind> = self.slots.lock().unwrap().keys().copied().collect();
        for kind in kinds {
            self.slots.lock().unwrap().remove(&kind);
            if let Err(err) = self.backend.destroy(kind) {
                warn!(window = kind.label(), error = %err, "failed to destroy window on quit");
            }
        }
    }

    pub fn live_count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    /// Census of the native windows actually open, used by the watchdog.
    pub fn open_windows(&self) -> Vec<OpenWindow> {
        self.backend.list_open()
    }

    pub fn close_native(&self, label: &str) -> Result<()> {
        if let Some(kind) = WindowKind::from_label(label) {
            self.slots.lock().unwrap().remove(&kind);
        }
        self.backend.close_label(label)
    }

    /// Drops slots whose native window has disappeared underneath the
    /// manager, so the next open reconstructs instead of targeting a ghost.
    pub fn prune_dead_slots(&self) -> usize {
        let mut slots = self.slots.lock().unwrap();
        let before = slots.len();
        slots.retain(|kind, _| self.backend.exists(*kind));
        let pruned = before - slots.len();
        if pruned > 0 {
            info!(pruned, "released references to vanished windows");
        }
        pruned
    }
}

/// Backend driving real Tauri webview windows.
pub struct TauriWindowBackend {
    app: tauri::AppHandle,
}

impl TauriWindowBackend {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }

    fn window(&self, kind: WindowKind) -> Result<tauri::WebviewWindow> {
        self.app
            .get_webview_window(kind.label())
            .ok_or_else(|| AppError::WindowLoad(format!("{} window is not open", kind.label())))
    }

    fn page(kind: WindowKind) -> &'static str {
        match kind {
            WindowKind::Translation => "translation.html",
            WindowKind::Settings => "settings.html",
            WindowKind::About => "about.html",
            WindowKind::TranslateNow => "translate-now.html",
            WindowKind::Crash => "crash.html",
        }
    }

    fn dimensions(kind: WindowKind) -> (f64, f64) {
        match kind {
            WindowKind::Translation => (520.0, 500.0),
            WindowKind::Settings => (480.0, 600.0),
            WindowKind::About => (300.0, 280.0),
            WindowKind::TranslateNow => (850.0, 600.0),
            WindowKind::Crash => (460.0, 360.0),
        }
    }

    fn resizable(kind: WindowKind) -> bool {
        !matches!(kind, WindowKind::About | WindowKind::Crash)
    }
}

impl WindowBackend for TauriWindowBackend {
    fn build(&self, kind: WindowKind) -> Result<()> {
        let (width, height) = Self::dimensions(kind);
        tauri::WebviewWindowBuilder::new(
            &self.app,
            kind.label(),
            tauri::WebviewUrl::App(Self::page(kind).into()),
        )
        .title(kind.title())
        .inner_size(width, height)
        .resizable(Self::resizable(kind))
        .build()
        .map(|_| ())
        .map_err(|e| {
            AppError::WindowLoad(format!("failed to build {} window: {}", kind.label(), e))
        })
    }

    fn show(&self, kind: WindowKind) -> Result<()> {
        self.window(kind)?
            .show()
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn hide(&self, kind: WindowKind) -> Result<()> {
        self.window(kind)?
            .hide()
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn focus(&self, kind: WindowKind) -> Result<()> {
        let window = self.window(kind)?;
        let _ = window.unminimize();
        let _ = window.show();
        window
            .set_focus()
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn destroy(&self, kind: WindowKind) -> Result<()> {
        match self.app.get_webview_window(kind.label()) {
            Some(window) => window
                .destroy()
                .map_err(|e| AppError::WindowLoad(e.to_string())),
            None => Ok(()),
        }
    }

    fn exists(&self, kind: WindowKind) -> bool {
        self.app.get_webview_window(kind.label()).is_some()
    }

    fn emit(&self, kind: WindowKind, event: &PopupEvent) -> Result<()> {
        self.window(kind)?
            .emit(event.name(), event)
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn resize(&self, kind: WindowKind, height: f64) -> Result<()> {
        let window = self.window(kind)?;
        let scale = window
            .scale_factor()
            .map_err(|e| AppError::WindowLoad(e.to_string()))?;
        let width = window
            .inner_size()
            .map_err(|e| AppError::WindowLoad(e.to_string()))?
            .to_logical::<f64>(scale)
            .width;
        window
            .set_size(tauri::LogicalSize::new(width, height))
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn set_always_on_top(&self, kind: WindowKind, on_top: bool) -> Result<()> {
        self.window(kind)?
            .set_always_on_top(on_top)
            .map_err(|e| AppError::WindowLoad(e.to_string()))
    }

    fn list_open(&self) -> Vec<OpenWindow> {
        self.app
            .webview_windows()
            .iter()
            .map(|(label, window)| OpenWindow {
                label: label.clone(),
                title: window.title().unwrap_or_default(),
            })
            .collect()
    }

    fn close_label(&self, label: &str) -> Result<()> {
        match self.app.get_webview_window(label) {
            Some(window) => window
                .destroy()
                .map_err(|e| AppError::WindowLoad(e.to_string())),
            None => Ok(()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingBackend;
    use super::*;

    fn manager() -> (Arc<RecordingBackend>, WindowLifecycleManager) {
        let backend = Arc::new(RecordingBackend::default());
        let manager = WindowLifecycleManager::new(backend.clone() as Arc<dyn WindowBackend>);
        (backend, manager)
    }

    #[test]
    fn test_open_twice_yields_single_instance() {
        let (backend, manager) = manager();

        assert!(manager.open_or_reveal(WindowKind::Translation).unwrap());
        assert!(!manager.open_or_reveal(WindowKind::Translation).unwrap());

        assert_eq!(backend.builds.load(Ordering::SeqCst), 1);
        assert_eq!(manager.live_count(), 1);
    }

    #[test]
    fn test_close_hides_instead_of_destroying() {
        let (backend, manager) = manager();
        manager.open_or_reveal(WindowKind::Settings).unwrap();

        let disposition = manager.handle_close_requested(WindowKind::Settings);

        assert_eq!(disposition, CloseDisposition::Hide);
        assert_eq!(backend.destroys.load(Ordering::SeqCst), 0);
        assert!(backend.exists(WindowKind::Settings));
        assert_eq!(manager.live_count(), 1);
    }

    #[test]
    fn test_close_while_quitting_destroys() {
        let (backend, manager) = manager();
        manager.open_or_reveal(WindowKind::Settings).unwrap();
        manager.set_quitting();

        let disposition = manager.handle_close_requested(WindowKind::Settings);

        assert_eq!(disposition, CloseDisposition::Destroy);
        assert_eq!(backend.destroys.load(Ordering::SeqCst), 1);
        assert_eq!(manager.live_count(), 0);
    }

    #[test]
    fn test_reveal_after_hide_reuses_instance() {
        let (backend, manager) = manager();
        manager.open_or_reveal(WindowKind::Translation).unwrap();
        manager.handle_close_requested(WindowKind::Translation);

        let created = manager.open_or_reveal(WindowKind::Translation).unwrap();

        assert!(!created);
        assert_eq!(backend.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_failure_clears_slot_for_retry() {
        let (backend, manager) = manager();
        backend.fail_builds.store(true, Ordering::SeqCst);

        let err = manager.open_or_reveal(WindowKind::Translation).unwrap_err();
        assert!(matches!(err, AppError::WindowLoad(_)));
        assert_eq!(manager.live_count(), 0);

        backend.fail_builds.store(false, Ordering::SeqCst);
        assert!(manager.open_or_reveal(WindowKind::Translation).unwrap());
    }

    #[test]
    fn test_mark_loaded_pushes_theme_once() {
        let (backend, manager) = manager();
        let settings = Settings::default();
        manager.open_or_reveal(WindowKind::Translation).unwrap();

        manager
            .mark_loaded(WindowKind::Translation, &settings)
            .unwrap();
        manager
            .mark_loaded(WindowKind::Translation, &settings)
            .unwrap();

        let events = backend.events_for(WindowKind::Translation);
        assert_eq!(events, vec![PopupEvent::SetDarkMode { enabled: true }]);
    }

    #[test]
    fn test_mark_loaded_pushes_settings_to_multi_tool_window() {
        let (backend, manager) = manager();
        let settings = Settings::default();
        manager.open_or_reveal(WindowKind::TranslateNow).unwrap();

        manager
            .mark_loaded(WindowKind::TranslateNow, &settings)
            .unwrap();

        let events = backend.events_for(WindowKind::TranslateNow);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], PopupEvent::LoadSettings { .. }));
    }

    #[test]
    fn test_destroy_all_clears_every_slot() {
        let (backend, manager) = manager();
        manager.open_or_reveal(WindowKind::Translation).unwrap();
        manager.open_or_reveal(WindowKind::About).unwrap();

        manager.set_quitting();
        manager.destroy_all();

        assert_eq!(manager.live_count(), 0);
        assert_eq!(backend.destroys.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prune_dead_slots_releases_vanished_windows() {
        let (backend, manager) = manager();
        manager.open_or_reveal(WindowKind::Translation).unwrap();
        manager.open_or_reveal(WindowKind::Settings).unwrap();

        // The native translation window disappears without the manager
        // hearing about it.
        backend.windows.lock().unwrap().remove(&WindowKind::Translation);

        assert_eq!(manager.prune_dead_slots(), 1);
        assert_eq!(manager.live_count(), 1);
    }
}
