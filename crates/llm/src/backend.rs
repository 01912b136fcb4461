//! OpenAI-compatible chat completions backend

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use fir_assist_config::OpenAiSettings;
use fir_assist_core::TextGenerator;

use crate::{check_status, send_error, LlmError};

/// System message sent ahead of every prompt
pub const SYSTEM_PROMPT: &str = "You are a legal AI assistant for FIR analysis.";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout: Duration::from_secs(20),
        }
    }
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &OpenAiSettings, timeout: Duration) -> Self {
        Self {
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            endpoint: settings.base_url.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }
}

pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("OpenAI API key is required".to_string()));
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

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.config.api_key);
        if let Ok(val) = HeaderValue::from_str(&auth_value) {
            headers.insert(AUTHORIZATION, val);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> OpenAIChatRequest<'a> {
        OpenAIChatRequest {
            model: &self.config.model,
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                OpenAIMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| send_error(e, self.config.timeout))?;

        let response: OpenAIChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response.into_text()?;
        tracing::debug!(
            model = %self.config.model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "OpenAI completion"
        );
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for OpenAIBackend {
    async fn generate_text(&self, prompt: &str) -> fir_assist_core::Result<String> {
        Ok(self.complete(prompt).await?)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            OpenAIBackend::new(OpenAIConfig::default()),
            Err(LlmError::Configuration(_))
        ));
        assert!(OpenAIBackend::new(OpenAIConfig::new("sk-test")).is_ok());
    }

    #[test]
    fn test_chat_url_trims_slash() {
        let backend =
            OpenAIBackend::new(OpenAIConfig::new("sk").with_endpoint("http://localhost:1234/v1/"))
                .unwrap();
        assert_eq!(backend.chat_url(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_request_shape() {
        let backend = OpenAIBackend::new(OpenAIConfig::new("sk")).unwrap();
        let body = serde_json::to_value(backend.build_request("extract this")).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], "extract this");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_response_text() {
        let response: OpenAIChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"intent\":[]}"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), r#"{"intent":[]}"#);

        let empty: OpenAIChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(empty.into_text(), Err(LlmError::InvalidResponse(_))));
    }
}
