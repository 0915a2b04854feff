use crate::domain::error::Result;
use crate::domain::settings::Settings;
use crate::infrastructure::llm_clients::{ChatClient, ChatRequest};
use crate::infrastructure::response::strip_code_fences;
use serde_json::Value;
use std::sync::Arc;

/// Optional language-learning aid: asks the model for the difficult words
/// in a capture plus synonyms, pitched at the configured IELTS level.
pub struct VocabularyUseCase {
    client: Arc<dyn ChatClient>,
}

impl VocabularyUseCase {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn execute(&self, settings: &Settings, text: &str) -> Result<String> {
        let prompt = format!(
            "extract important words from below text based on ielts {} and write maximum 4 synonyms for each word based on this structure:\n\
             [{{\"originalWord\":X,\"synonyms\":[Y,Z,Y,M]}}]\n\
             text: {}",
            settings.ielts_level, text
        );

        let raw = self
            .client
            .complete(&ChatRequest::from_settings(settings, prompt).with_json_response())
            .await?;

        Ok(flatten_vocabulary(&raw))
    }
}

/// Flattens the model's JSON into `word: syn1, syn2` lines. The parse is
/// deliberately tolerant: the misspelled `orginalWord` key and an
/// object-wrapped array both occur in the wild. Anything unparseable is
/// returned unchanged rather than surfaced as an error.
pub fn flatten_vocabulary(raw: &str) -> String {
    let cleaned = strip_code_fences(raw);
    let parsed: Value = match serde_json::from_str(cleaned.trim()) {
        Ok(value) => value,
        Err(_) => return raw.to_string(),
    };

    let lines: Vec<String> = match &parsed {
        Value::Array(items) => items.iter().filter_map(term_line).collect(),
        Value::Object(map) => map
            .values()
            .find_map(Value::as_array)
            .map(|items| items.iter().filter_map(term_line).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    lines.join("\n")
}

fn term_line(term: &Value) -> Option<String> {
    let word = term
        .get("originalWord")
        .or_else(|| term.get("orginalWord"))?
        .as_str()?;
    let synonyms: Vec<&str> = term
        .get("synonyms")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    Some(format!("{}: {}", word, synonyms.join(", ")))
}
