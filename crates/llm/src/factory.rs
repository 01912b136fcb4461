//! Provider selection
//!
//! [`ProviderClient`] is a closed set of backends. Adding a provider adds a
//! variant here; callers only ever see [`TextGenerator`].

use async_trait::async_trait;

use fir_assist_config::{ProviderKind, ProviderSettings};
use fir_assist_core::TextGenerator;

use crate::{
    ClaudeBackend, ClaudeConfig, CustomBackend, CustomConfig, LlmError, OpenAIBackend,
    OpenAIConfig,
};

pub enum ProviderClient {
    OpenAi(OpenAIBackend),
    Anthropic(ClaudeBackend),
    Custom(CustomBackend),
}

impl ProviderClient {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderClient::OpenAi(_) => ProviderKind::OpenAi,
            ProviderClient::Anthropic(_) => ProviderKind::Anthropic,
            ProviderClient::Custom(_) => ProviderKind::Custom,
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self {
            ProviderClient::OpenAi(backend) => backend.complete(prompt).await,
            ProviderClient::Anthropic(backend) => backend.complete(prompt).await,
            ProviderClient::Custom(backend) => backend.complete(prompt).await,
        }
    }
}

#[async_trait]
impl TextGenerator for ProviderClient {
    async fn generate_text(&self, prompt: &str) -> fir_assist_core::Result<String> {
        Ok(self.complete(prompt).await?)
    }

    fn provider_name(&self) -> &str {
        self.kind().as_str()
    }
}

/// Factory for provider clients
pub struct LlmFactory;

impl LlmFactory {
    /// Build the client for the active provider. Fails with the joined
    /// validation messages when the provider is not usable.
    pub fn create(settings: &ProviderSettings) -> Result<ProviderClient, LlmError> {
        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(LlmError::Configuration(errors.join("; ")));
        }

        let timeout = settings.timeout();
        let client = match settings.kind {
            ProviderKind::OpenAi => ProviderClient::OpenAi(OpenAIBackend::new(
                OpenAIConfig::from_settings(&settings.openai, timeout),
            )?),
            ProviderKind::Anthropic => ProviderClient::Anthropic(ClaudeBackend::new(
                ClaudeConfig::from_settings(&settings.anthropic, timeout),
            )?),
            ProviderKind::Custom => ProviderClient::Custom(CustomBackend::new(
                CustomConfig::from_settings(&settings.custom, timeout),
            )?),
        };

        tracing::info!(provider = client.kind().as_str(), "Created text-generation client");
        Ok(client)
    }

    /// Like [`LlmFactory::create`], but logs and returns `None` on configuration errors
    pub fn create_optional(settings: &ProviderSettings) -> Option<ProviderClient> {
        match Self::create(settings) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "Provider unavailable, keyword and rule fallbacks only");
                None
            },
        }
    }
}
