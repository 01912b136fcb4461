//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ProviderSettings};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Text-generation provider
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Domain configuration file (taxonomy and legal rules). The embedded
    /// reference configuration is used when unset.
    #[serde(default)]
    pub domain_config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Idle conversations are dropped after this many seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    60
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            cors_enabled: true,
            request_timeout_secs: default_request_timeout(),
            session_ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of preceding turns given to the extractor as context
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Recompute the classification after every turn; otherwise on demand
    #[serde(default = "default_true")]
    pub classify_every_turn: bool,

    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_history_window() -> usize {
    5
}

fn default_greeting() -> String {
    "Hello! I'm your GenAI assistant. I'll help you fill out the FIR and extract structured \
     information from our conversation. You can type or use voice input to describe the incident."
        .to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            classify_every_turn: true,
            greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Speak every assistant reply
    #[serde(default)]
    pub auto_speak: bool,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_rate")]
    pub rate: f32,

    #[serde(default = "default_pitch")]
    pub pitch: f32,

    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_rate() -> f32 {
    0.9
}

fn default_pitch() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    0.8
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_speak: false,
            language: default_language(),
            rate: default_rate(),
            pitch: default_pitch(),
            volume: default_volume(),
        }
    }
}

impl VoiceConfig {
    pub fn speech_options(&self) -> fir_assist_core::SpeechOptions {
        fir_assist_core::SpeechOptions {
            language: self.language.clone(),
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

impl Settings {
    /// Validate numeric ranges. Missing provider credentials are not an error
    /// here; see [`ProviderSettings::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }

        if !(1..=120).contains(&self.provider.timeout_secs) {
            return Err(invalid(
                "provider.timeout_secs",
                format!("Must be between 1 and 120, got {}", self.provider.timeout_secs),
            ));
        }

        // A turn makes up to two provider calls
        let turn_budget = self.provider.timeout_secs.saturating_mul(2);
        if self.server.request_timeout_secs < turn_budget {
            return Err(invalid(
                "server.request_timeout_secs",
                format!(
                    "Must be at least twice provider.timeout_secs ({}), got {}",
                    turn_budget, self.server.request_timeout_secs
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.provider.confidence_threshold) {
            return Err(invalid(
                "provider.confidence_threshold",
                format!("Must be between 0 and 1, got {}", self.provider.confidence_threshold),
            ));
        }

        if !(1..=50).contains(&self.conversation.history_window) {
            return Err(invalid(
                "conversation.history_window",
                format!("Must be between 1 and 50, got {}", self.conversation.history_window),
            ));
        }

        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(invalid("voice.volume", "Must be between 0 and 1"));
        }

        if self.voice.rate <= 0.0 || self.voice.rate > 10.0 {
            return Err(invalid("voice.rate", "Must be in (0, 10]"));
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // e.g. FIR_ASSIST__PROVIDER__KIND=anthropic
    builder = builder.add_source(
        Environment::with_prefix("FIR_ASSIST")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;
    settings.provider = settings.provider.with_env_fallbacks();

    settings.validate()?;

    tracing::debug!(
        provider = settings.provider.kind.as_str(),
        classify_every_turn = settings.conversation.classify_every_turn,
        "Settings loaded"
    );

    Ok(settings)
}

/// Load settings from an explicit file, without environment overrides
pub fn load_settings_from_file(path: &str) -> Result<Settings, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Err(ConfigError::FileNotFound(path.to_string()));
    }
    let config = Config::builder()
        .add_source(File::with_name(path))
        .build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderKind;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.conversation.history_window, 5);
        assert!(settings.conversation.classify_every_turn);
        assert!(!settings.voice.auto_speak);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.provider.timeout_secs = 0;
        assert!(settings.validate().is_err());

        settings.provider.timeout_secs = 30;
        assert!(settings.validate().is_ok());

        settings.conversation.history_window = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_request_timeout_covers_provider_calls() {
        let mut settings = Settings::default();
        settings.provider.timeout_secs = 45;
        settings.server.request_timeout_secs = 60;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.request_timeout_secs"
        ));

        settings.server.request_timeout_secs = 90;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_key_does_not_fail_validation() {
        let settings = Settings::default();
        assert!(!settings.provider.validation().is_valid);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "provider:\n  kind: anthropic\n  anthropic:\n    api_key: test-key\n  timeout_secs: 15\nconversation:\n  classify_every_turn: false\n"
        )
        .unwrap();

        let settings = load_settings_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.provider.kind, ProviderKind::Anthropic);
        assert_eq!(settings.provider.anthropic.api_key.as_deref(), Some("test-key"));
        assert_eq!(settings.provider.timeout_secs, 15);
        assert!(!settings.conversation.classify_every_turn);
        // Untouched sections keep their defaults
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_settings_from_file("/nonexistent/fir.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_speech_options_from_voice_config() {
        let options = VoiceConfig::default().speech_options();
        assert_eq!(options.language, "en-US");
        assert_eq!(options.volume, 0.8);
    }
}
