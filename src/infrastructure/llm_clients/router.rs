use super::{ChatClient, ChatRequest};
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DIRECT_IP_URL: &str = "https://198.143.1.89/api/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RouterClient {
    client: reqwest::Client,
    base_url: Option<String>,
    timeout: Duration,
}

impl RouterClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Some(base_url.into()),
            timeout,
        }
    }

    fn endpoint(&self, request: &ChatRequest) -> String {
        if let Some(base_url) = &self.base_url {
            base_url.clone()
        } else if request.use_direct_ip {
            DIRECT_IP_URL.to_string()
        } else {
            OPENROUTER_URL.to_string()
        }
    }

    fn api_key(request: &ChatRequest) -> Result<String> {
        let api_key = request.api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::MissingApiKey);
        }
        Ok(api_key.to_string())
    }
}

#[async_trait]
impl ChatClient for RouterClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = Self::api_key(request)?;

        let mut body = json!({
            "model": request.model,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ],
        });
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(self.endpoint(request))
            .timeout(self.timeout)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Network(format!(
                        "request timed out after {} seconds",
                        self.timeout.as_secs()
                    ))
                } else {
                    AppError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Server { status, message });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}
