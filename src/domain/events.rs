use crate::domain::settings::Settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text captured from the current selection. Consumed once by the
/// translation pipeline, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub text: String,
    pub captured_at: DateTime<Utc>,
}

/// Every event a popup window can receive, with a fixed payload shape per
/// kind. Serialization is untagged: the renderer sees only the payload, the
/// event name travels separately via `name()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PopupEvent {
    #[serde(rename_all = "camelCase")]
    StartTranslation { text: String },
    #[serde(rename_all = "camelCase")]
    TranslationComplete {
        original_text: String,
        translated_text: String,
    },
    TranslationError { error: String },
    VocabularyLoading,
    #[serde(rename_all = "camelCase")]
    VocabularyComplete { vocabulary: String },
    VocabularyError,
    #[serde(rename_all = "camelCase")]
    SetDarkMode { enabled: bool },
    #[serde(rename_all = "camelCase")]
    LoadSettings { settings: Settings },
    #[serde(rename_all = "camelCase")]
    CrashReport {
        message: String,
        log_path: Option<String>,
    },
}

impl PopupEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PopupEvent::StartTranslation { .. } => "start-translation",
            PopupEvent::TranslationComplete { .. } => "translation-complete",
            PopupEvent::TranslationError { .. } => "translation-error",
            PopupEvent::VocabularyLoading => "vocabulary-loading",
            PopupEvent::VocabularyComplete { .. } => "vocabulary-complete",
            PopupEvent::VocabularyError => "vocabulary-error",
            PopupEvent::SetDarkMode { .. } => "set-dark-mode",
            PopupEvent::LoadSettings { .. } => "load-settings",
            PopupEvent::CrashReport { .. } => "crash-report",
        }
    }
}
