//! Text-generation provider integration
//!
//! Features:
//! - OpenAI-style chat completions, Anthropic messages and custom HTTP backends
//! - A tagged-union client selected from settings
//! - Lenient extraction of JSON objects from free-form model output

pub mod backend;
pub mod claude;
pub mod custom;
pub mod factory;
pub mod json;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use claude::{ClaudeBackend, ClaudeConfig};
pub use custom::{CustomBackend, CustomConfig};
pub use factory::{LlmFactory, ProviderClient};
pub use json::{json_object_span, parse_json_object};

use std::time::Duration;
use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for fir_assist_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Api { status, body } => fir_assist_core::Error::ProviderStatus { status, body },
            LlmError::Network(msg) => fir_assist_core::Error::Provider(msg),
            LlmError::InvalidResponse(msg) => fir_assist_core::Error::Parse(msg),
            LlmError::Timeout(after) => fir_assist_core::Error::Timeout(after),
            LlmError::Configuration(msg) => fir_assist_core::Error::Configuration(msg),
        }
    }
}

/// Turn a non-2xx response into [`LlmError::Api`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Map a send failure, reporting client timeouts as [`LlmError::Timeout`]
pub(crate) fn send_error(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_to_provider_status() {
        let err: fir_assist_core::Error = LlmError::Api {
            status: 429,
            body: "rate limited".into(),
        }
        .into();
        assert_eq!(
            err,
            fir_assist_core::Error::ProviderStatus {
                status: 429,
                body: "rate limited".into()
            }
        );
    }

    #[test]
    fn test_invalid_response_maps_to_parse() {
        let err: fir_assist_core::Error = LlmError::InvalidResponse("no choices".into()).into();
        assert!(matches!(err, fir_assist_core::Error::Parse(_)));
        assert!(err.is_recoverable());
    }
}
