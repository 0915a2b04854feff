use crate::domain::error::{AppError, Result};
use crate::domain::settings::Settings;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// The settings collaborator: a JSON document under the app data directory,
/// loaded once at startup and rewritten on every change. Partial updates
/// merge top-level keys into the current document so callers never have to
/// send the full settings object.
pub struct SettingsStore {
    settings: Mutex<Settings>,
    settings_path: PathBuf,
}

impl SettingsStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let settings_path = config_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Self {
            settings: Mutex::new(settings),
            settings_path,
        }
    }

    fn load_from_file(path: &PathBuf) -> Option<Settings> {
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    warn!(error = %e, "failed to parse settings file, using defaults");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to read settings file, using defaults");
                None
            }
        }
    }

    pub fn get(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    /// Merges a partial JSON object into the current document and persists
    /// the result. Keys absent from the patch keep their current values.
    pub fn set(&self, partial: serde_json::Value) -> Result<Settings> {
        let patch = partial
            .as_object()
            .ok_or_else(|| AppError::Config("settings patch must be a JSON object".to_string()))?;

        let mut guard = self.settings.lock().unwrap();

        let mut document = serde_json::to_value(&*guard)
            .map_err(|e| AppError::Config(format!("failed to serialize settings: {}", e)))?;
        let Some(fields) = document.as_object_mut() else {
            return Err(AppError::Config(
                "settings did not serialize to a JSON object".to_string(),
            ));
        };
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }

        let merged: Settings = serde_json::from_value(document)
            .map_err(|e| AppError::Config(format!("invalid settings value: {}", e)))?;

        self.save(&merged)?;
        *guard = merged.clone();
        Ok(merged)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Config(format!("failed to serialize settings: {}", e)))?;
        fs::write(&self.settings_path, content)?;
        Ok(())
    }
}
