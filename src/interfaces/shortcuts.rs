use crate::domain::error::{AppError, Result};
use crate::domain::settings::HotkeyBinding;
use crate::interfaces::commands::AppContext;
use crate::interfaces::windows::WindowKind;
use std::str::FromStr;
use std::sync::Arc;
use tauri::Manager;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};
use tracing::{info, warn};

/// What a registered shortcut triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TranslateSelection,
    LanguageTools,
}

/// Registration seam for the process-wide shortcut namespace.
pub trait ShortcutBackend: Send + Sync {
    fn unregister_all(&self) -> Result<()>;
    fn register(&self, binding: &HotkeyBinding, action: ShortcutAction) -> Result<()>;
}

/// Alternatives chosen to avoid common application conflicts. All of them
/// are attempted on every registration pass regardless of whether the
/// primary succeeded: OS-level registration can silently fail per binding
/// when another running program already owns the chord.
fn alternative_bindings() -> [HotkeyBinding; 4] {
    [
        HotkeyBinding::new(&["CommandOrControl", "Shift"], "D"),
        HotkeyBinding::new(&["CommandOrControl", "Shift"], "1"),
        HotkeyBinding::new(&["CommandOrControl", "Alt"], "1"),
        HotkeyBinding::new(&["Alt", "Shift"], "1"),
    ]
}

pub struct HotkeyRegistry {
    backend: Arc<dyn ShortcutBackend>,
}

impl HotkeyRegistry {
    pub fn new(backend: Arc<dyn ShortcutBackend>) -> Self {
        Self { backend }
    }

    /// Tears down every existing binding, then registers the primary
    /// binding, the fixed alternative set, and (when given) the language
    /// tools binding. Returns the display names of the bindings that took.
    /// Zero successes is non-fatal: the tray menu still reaches the
    /// pipeline.
    pub fn register(
        &self,
        primary: &HotkeyBinding,
        language_tools: Option<&HotkeyBinding>,
    ) -> Vec<String> {
        if let Err(err) = self.backend.unregister_all() {
            warn!(error = %err, "failed to clear previous shortcut registrations");
        }

        let mut registered = Vec::new();

        match self
            .backend
            .register(primary, ShortcutAction::TranslateSelection)
        {
            Ok(()) => registered.push(primary.display()),
            Err(err) => warn!(shortcut = %primary.display(), error = %err, "failed to register primary shortcut"),
        }

        for alternative in alternative_bindings() {
            if alternative.display() == primary.display() {
                continue;
            }
            match self
                .backend
                .register(&alternative, ShortcutAction::TranslateSelection)
            {
                Ok(()) => registered.push(alternative.display()),
                Err(err) => {
                    warn!(shortcut = %alternative.display(), error = %err, "failed to register alternative shortcut")
                }
            }
        }

        if let Some(binding) = language_tools {
            match self.backend.register(binding, ShortcutAction::LanguageTools) {
                Ok(()) => registered.push(binding.display()),
                Err(err) => {
                    warn!(shortcut = %binding.display(), error = %err, "failed to register language tools shortcut")
                }
            }
        }

        if registered.is_empty() {
            warn!("no global shortcut registered; translation stays reachable from the tray menu");
        } else {
            info!(shortcuts = registered.join(", "), "active shortcuts");
        }

        registered
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.unregister_all()
    }
}

pub(crate) fn parse_binding(binding: &HotkeyBinding) -> Result<Shortcut> {
    let mut modifiers = Modifiers::empty();

    for modifier in &binding.modifiers {
        match modifier.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "cmd" | "command" | "meta" | "win" | "super" => modifiers |= Modifiers::META,
            "commandorcontrol" => {
                if cfg!(target_os = "macos") {
                    modifiers |= Modifiers::META;
                } else {
                    modifiers |= Modifiers::CONTROL;
                }
            }
            other => {
                return Err(AppError::HotkeyRegistration(format!(
                    "unknown modifier: {}",
                    other
                )));
            }
        }
    }

    let code = parse_code(&binding.key)?;
    let modifiers = if modifiers.is_empty() {
        None
    } else {
        Some(modifiers)
    };
    Ok(Shortcut::new(modifiers, code))
}

fn parse_code(key: &str) -> Result<Code> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::HotkeyRegistration(
            "shortcut key is empty".to_string(),
        ));
    }

    let normalized = match key {
        "Esc" => "Escape".to_string(),
        "Space" | "Enter" | "Tab" | "Backspace" | "Delete" => key.to_string(),
        "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" => key.to_string(),
        "PageUp" | "PageDown" | "Home" | "End" | "Insert" => key.to_string(),
        _ if key.len() == 1 => {
            let ch = key.chars().next().unwrap();
            if ch.is_ascii_alphabetic() {
                format!("Key{}", ch.to_ascii_uppercase())
            } else if ch.is_ascii_digit() {
                format!("Digit{}", ch)
            } else {
                match ch {
                    '-' => "Minus".to_string(),
                    '=' => "Equal".to_string(),
                    ',' => "Comma".to_string(),
                    '.' => "Period".to_string(),
                    '/' => "Slash".to_string(),
                    ';' => "Semicolon".to_string(),
                    '\'' => "Quote".to_string(),
                    '[' => "BracketLeft".to_string(),
                    ']' => "BracketRight".to_string(),
                    '\\' => "Backslash".to_string(),
                    '`' => "Backquote".to_string(),
                    _ => {
                        return Err(AppError::HotkeyRegistration(format!(
                            "unsupported key: {}",
                            key
                        )))
                    }
                }
            }
        }
        _ if key.starts_with('F') && key[1..].chars().all(|c| c.is_ascii_digit()) => {
            key.to_string()
        }
        _ => key.to_string(),
    };

    Code::from_str(&normalized)
        .map_err(|_| AppError::HotkeyRegistration(format!("unsupported key: {}", key)))
}

/// Backend binding into the global-shortcut plugin. Every successful
/// registration wires the same trigger action; the handler fires on key
/// press only and resolves the application context at trigger time.
pub struct TauriShortcutBackend {
    app: tauri::AppHandle,
}

impl TauriShortcutBackend {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl ShortcutBackend for TauriShortcutBackend {
    fn unregister_all(&self) -> Result<()> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|e| AppError::HotkeyRegistration(e.to_string()))
    }

    fn register(&self, binding: &HotkeyBinding, action: ShortcutAction) -> Result<()> {
        let shortcut = parse_binding(binding)?;
        let handle = self.app.clone();

        self.app
            .global_shortcut()
            .on_shortcut(shortcut, move |_app, _shortcut, event| {
                if event.state() == ShortcutState::Released {
                    return;
                }
                let handle = handle.clone();
                tauri::async_runtime::spawn(async move {
                    let Some(ctx) = handle.try_state::<Arc<AppContext>>() else {
                        return;
                    };
                    let ctx = ctx.inner().clone();
                    match action {
                        ShortcutAction::TranslateSelection => {
                            ctx.orchestrator.run_capture_pipeline().await;
                        }
                        ShortcutAction::LanguageTools => {
                            if let Err(err) = ctx.windows.open_or_reveal(WindowKind::TranslateNow) {
                                warn!(error = %err, "failed to open language tools window");
                            }
                        }
                    }
                });
            })
            .map_err(|e| {
                AppError::HotkeyRegistration(format!("{}: {}", binding.display(), e))
            })
    }
}
