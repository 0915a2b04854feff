use crate::domain::error::Result;
use crate::domain::settings::Settings;
use crate::infrastructure::llm_clients::{ChatClient, ChatRequest};
use crate::infrastructure::response::strip_code_fences;
use std::sync::Arc;

pub struct TranslateUseCase {
    client: Arc<dyn ChatClient>,
}

impl TranslateUseCase {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn execute(&self, settings: &Settings, text: &str) -> Result<String> {
        let prompt = format!(
            "Please translate the following text to {}.\n\
             IMPORTANT: Return ONLY the raw translated text with no formatting, no code blocks, no backticks, no quotes, and no other symbols surrounding it.\n\
             Text: {}",
            settings.target_language, text
        );

        let raw = self
            .client
            .complete(&ChatRequest::from_settings(settings, prompt))
            .await?;

        Ok(strip_code_fences(&raw))
    }
}
