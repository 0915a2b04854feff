use serde::{Deserialize, Serialize};

/// A global shortcut as stored in the settings document: a set of modifier
/// names plus a single key symbol. The `CommandOrControl` modifier resolves
/// to Command on macOS and Control everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl HotkeyBinding {
    pub fn new(modifiers: &[&str], key: &str) -> Self {
        Self {
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.to_string(),
        }
    }

    /// Human-readable form used for tray labels and registration reports.
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = self
            .modifiers
            .iter()
            .map(|name| resolve_modifier_name(name))
            .collect();
        parts.push(self.key.clone());
        parts.join("+")
    }

    pub fn default_translate() -> Self {
        if cfg!(target_os = "macos") {
            Self::new(&["Control", "Shift"], "Q")
        } else {
            Self::new(&["Control"], "Q")
        }
    }

    pub fn default_language_tools() -> Self {
        Self::new(&["Control", "Shift"], "L")
    }
}

fn resolve_modifier_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("commandorcontrol") {
        if cfg!(target_os = "macos") {
            "Command".to_string()
        } else {
            "Control".to_string()
        }
    } else {
        name.to_string()
    }
}

/// The settings document persisted as JSON. Field names stay camelCase on
/// disk so documents written by earlier releases keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_key: String,
    pub target_language: String,
    #[serde(rename = "useDirectIPConnection")]
    pub use_direct_ip_connection: bool,
    pub language_model: String,
    pub dark_mode: bool,
    pub run_at_startup: bool,
    pub keyboard_shortcut: HotkeyBinding,
    pub language_tools_shortcut: HotkeyBinding,
    pub active_learn_vocabulary: bool,
    pub ielts_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            target_language: "persian".to_string(),
            use_direct_ip_connection: false,
            language_model: "deepseek/deepseek-prover-v2:free".to_string(),
            dark_mode: true,
            run_at_startup: false,
            keyboard_shortcut: HotkeyBinding::default_translate(),
            language_tools_shortcut: HotkeyBinding::default_language_tools(),
            active_learn_vocabulary: false,
            ielts_level: "6.5".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_serialize_camel_case() {
        let settings = Settings::default();
        let json = serde_json::to_value(&settings).unwrap();
        assert!(json.get("apiKey").is_some());
        assert!(json.get("targetLanguage").is_some());
        assert!(json.get("useDirectIPConnection").is_some());
        assert!(json.get("keyboardShortcut").is_some());
        assert!(json.get("activeLearnVocabulary").is_some());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_binding_display_joins_parts() {
        let binding = HotkeyBinding::new(&["Control", "Shift"], "Q");
        assert_eq!(binding.display(), "Control+Shift+Q");
    }

    #[test]
    fn test_binding_display_resolves_command_or_control() {
        let binding = HotkeyBinding::new(&["CommandOrControl", "Shift"], "D");
        let display = binding.display();
        if cfg!(target_os = "macos") {
            assert_eq!(display, "Command+Shift+D");
        } else {
            assert_eq!(display, "Control+Shift+D");
        }
    }
}
