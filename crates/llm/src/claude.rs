//! Anthropic Messages API backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use fir_assist_config::AnthropicSettings;
use fir_assist_core::TextGenerator;

use crate::{check_status, send_error, LlmError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 1000,
            timeout: Duration::from_secs(20),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &AnthropicSettings, timeout: Duration) -> Self {
        Self {
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            timeout,
            endpoint: settings.endpoint.clone(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    #[serde(default)]
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeApiResponse {
    /// Text of the first content block
    fn into_text(self) -> Result<String, LlmError> {
        let first = self
            .content
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Empty content".to_string()))?;
        first.text.ok_or_else(|| {
            LlmError::InvalidResponse(format!("First content block is `{}`, not text", first.kind))
        })
    }
}

pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("Anthropic API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> ClaudeRequest<'a> {
        ClaudeRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| send_error(e, self.config.timeout))?;

        let response: ClaudeApiResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response.into_text()?;
        tracing::debug!(
            model = %self.config.model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Claude completion"
        );
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for ClaudeBackend {
    async fn generate_text(&self, prompt: &str) -> fir_assist_core::Result<String> {
        Ok(self.complete(prompt).await?)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            ClaudeBackend::new(ClaudeConfig::default()),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let backend = ClaudeBackend::new(ClaudeConfig::new("key")).unwrap();
        assert_eq!(backend.messages_url(), "https://api.anthropic.com/v1/messages");

        let body = serde_json::to_value(backend.build_request("classify")).unwrap();
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "classify");
    }

    #[test]
    fn test_first_block_text() {
        let response: ClaudeApiResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"first"},{"type":"text","text":"second"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "first");

        let empty: ClaudeApiResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(empty.into_text().is_err());
    }
}
