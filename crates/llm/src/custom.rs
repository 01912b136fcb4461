//! Custom HTTP text-generation endpoint
//!
//! Posts `{prompt, model}` with configured headers and reads the first present
//! of `response`, `content` or `text` from the JSON reply.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use fir_assist_config::CustomSettings;
use fir_assist_core::TextGenerator;

use crate::{check_status, send_error, LlmError};

/// Reply fields checked, in order
const TEXT_FIELDS: [&str; 3] = ["response", "content", "text"];

#[derive(Debug, Clone)]
pub struct CustomConfig {
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    pub model: String,
    pub timeout: Duration,
}

impl CustomConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            model: "custom-model".to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn from_settings(settings: &CustomSettings, timeout: Duration) -> Self {
        Self {
            endpoint: settings.endpoint.clone().unwrap_or_default(),
            headers: settings.headers.clone(),
            model: settings.model.clone(),
            timeout,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct CustomRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

/// Pick the generated text out of a custom endpoint's JSON reply
fn extract_text(value: &serde_json::Value) -> Option<String> {
    TEXT_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

pub struct CustomBackend {
    config: CustomConfig,
    headers: HeaderMap,
    client: Client,
}

impl CustomBackend {
    pub fn new(config: CustomConfig) -> Result<Self, LlmError> {
        if config.endpoint.trim().is_empty() {
            return Err(LlmError::Configuration(
                "Custom provider endpoint is required".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LlmError::Configuration(format!("Invalid header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| LlmError::Configuration(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self {
            config,
            headers,
            client,
        })
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.headers.clone())
            .json(&CustomRequest {
                prompt,
                model: &self.config.model,
            })
            .send()
            .await
            .map_err(|e| send_error(e, self.config.timeout))?;

        let body: serde_json::Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        extract_text(&body).ok_or_else(|| {
            LlmError::InvalidResponse("Reply has no response, content or text field".to_string())
        })
    }
}

#[async_trait]
impl TextGenerator for CustomBackend {
    async fn generate_text(&self, prompt: &str) -> fir_assist_core::Result<String> {
        Ok(self.complete(prompt).await?)
    }

    fn provider_name(&self) -> &str {
        "custom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text_field_order() {
        assert_eq!(
            extract_text(&json!({"text": "c", "content": "b", "response": "a"})).as_deref(),
            Some("a")
        );
        assert_eq!(extract_text(&json!({"text": "c", "content": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_text(&json!({"text": "c"})).as_deref(), Some("c"));
        assert_eq!(extract_text(&json!({"output": "x"})), None);
        // Non-string values are skipped
        assert_eq!(extract_text(&json!({"response": 1, "text": "t"})).as_deref(), Some("t"));
    }

    #[test]
    fn test_requires_endpoint() {
        assert!(matches!(
            CustomBackend::new(CustomConfig::new("")),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = CustomConfig::new("http://localhost:9000").with_header("bad header", "x");
        assert!(matches!(
            CustomBackend::new(config),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_custom_headers_applied() {
        let config =
            CustomConfig::new("http://localhost:9000").with_header("Authorization", "Bearer t");
        let backend = CustomBackend::new(config).unwrap();
        assert_eq!(backend.headers.get("authorization").unwrap(), "Bearer t");
        assert_eq!(backend.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
