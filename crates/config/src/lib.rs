//! Configuration management for the FIR assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, `config/{env}`)
//! - Environment variables (FIR_ASSIST__ prefix, `__` separator)
//!
//! # Domain Configuration
//!
//! The taxonomy, the legal rule table and the classification thresholds are
//! data, loaded from a domain file (`config/domain.yaml`). A reference copy is
//! embedded in the binary so the assistant works without any file present.

pub mod domain;
pub mod provider;
pub mod settings;

pub use domain::{load_domain_config, DomainConfig, LegalRule, SeverityThresholds, TagRef};
pub use provider::{
    AnthropicSettings, ConfigValidation, CustomSettings, OpenAiSettings, ProviderKind,
    ProviderSettings,
};
pub use settings::{
    load_settings, load_settings_from_file, ConversationConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, VoiceConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for fir_assist_core::Error {
    fn from(err: ConfigError) -> Self {
        fir_assist_core::Error::Configuration(err.to_string())
    }
}
