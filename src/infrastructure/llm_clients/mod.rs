pub mod router;

use crate::domain::error::Result;
use crate::domain::settings::Settings;
use async_trait::async_trait;

pub use router::RouterClient;

/// One chat-completion call, built fresh per invocation from the current
/// settings. No retry state is kept here; a failed call surfaces as an error
/// and the user re-triggers.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub use_direct_ip: bool,
    pub json_response: bool,
}

impl ChatRequest {
    pub fn from_settings(settings: &Settings, prompt: String) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.language_model.clone(),
            prompt,
            use_direct_ip: settings.use_direct_ip_connection,
            json_response: false,
        }
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}
