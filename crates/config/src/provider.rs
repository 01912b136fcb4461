//! Text-generation provider settings
//!
//! Validation of provider settings never fails loading: it produces a list
//! of human-readable problems that the conversation surfaces as provider
//! health, while extraction and classification keep working on their
//! deterministic fallbacks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Custom,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some(ProviderKind::OpenAi),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            "custom" => Some(ProviderKind::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_anthropic_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_anthropic_model(),
            endpoint: default_anthropic_endpoint(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSettings {
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Extra headers sent with every request (e.g. Authorization)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_custom_model")]
    pub model: String,
}

fn default_custom_model() -> String {
    "custom-model".to_string()
}

impl Default for CustomSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            headers: HashMap::new(),
            model: default_custom_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub anthropic: AnthropicSettings,

    #[serde(default)]
    pub custom: CustomSettings,

    /// Upper bound on a single provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Advisory only; parsed output is never filtered by it
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// When false, extraction failures surface instead of using keyword rules
    #[serde(default = "default_true")]
    pub enable_fallback: bool,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_confidence_threshold() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            openai: OpenAiSettings::default(),
            anthropic: AnthropicSettings::default(),
            custom: CustomSettings::default(),
            timeout_secs: default_timeout_secs(),
            confidence_threshold: default_confidence_threshold(),
            enable_fallback: true,
        }
    }
}

/// Result of validating the active provider's settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValidation {
    pub provider: ProviderKind,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Problems with the active provider's settings, as user-facing messages
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self.kind {
            ProviderKind::OpenAi => {
                if !non_blank(&self.openai.api_key) {
                    errors.push("OpenAI API key is required".to_string());
                }
            },
            ProviderKind::Anthropic => {
                if !non_blank(&self.anthropic.api_key) {
                    errors.push("Anthropic API key is required".to_string());
                }
            },
            ProviderKind::Custom => {
                if !non_blank(&self.custom.endpoint) {
                    errors.push("Custom provider endpoint is required".to_string());
                }
            },
        }
        errors
    }

    pub fn validation(&self) -> ConfigValidation {
        let errors = self.validate();
        ConfigValidation {
            provider: self.kind,
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Fill unset credentials from the conventional environment variables
    pub fn with_env_fallbacks(mut self) -> Self {
        self.apply_env_fallbacks(|key| std::env::var(key).ok());
        self
    }

    fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if !non_blank(&self.openai.api_key) {
            self.openai.api_key = lookup("OPENAI_API_KEY");
        }
        if !non_blank(&self.anthropic.api_key) {
            self.anthropic.api_key = lookup("ANTHROPIC_API_KEY");
        }
        if !non_blank(&self.custom.endpoint) {
            self.custom.endpoint = lookup("CUSTOM_GENAI_ENDPOINT");
        }
        if !self.custom.headers.contains_key("Authorization") {
            if let Some(auth) = lookup("CUSTOM_GENAI_AUTH") {
                self.custom.headers.insert("Authorization".to_string(), auth);
            }
        }
    }
}
