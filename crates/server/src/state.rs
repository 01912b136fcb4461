//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use fir_assist_agent::{ConversationConfig, FirConversation};
use fir_assist_config::{DomainConfig, Settings};
use fir_assist_core::TextGenerator;
use fir_assist_llm::LlmFactory;

use crate::session::{Session, SessionManager};
use crate::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub domain: Arc<DomainConfig>,
    /// Shared provider client; `None` runs on keyword and rule fallbacks
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub sessions: Arc<SessionManager>,
    /// Provider validation messages captured at startup
    pub config_errors: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(settings: Settings, domain: DomainConfig) -> Self {
        let config_errors = settings.provider.validate();
        let generator = LlmFactory::create_optional(&settings.provider)
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
        let sessions = SessionManager::with_config(
            settings.server.max_sessions,
            Duration::from_secs(settings.server.session_ttl_secs),
            Duration::from_secs(300),
        );

        Self {
            settings: Arc::new(settings),
            domain: Arc::new(domain),
            generator,
            sessions: Arc::new(sessions),
            config_errors: Arc::new(config_errors),
        }
    }

    /// Replace the provider client. A supplied client clears startup
    /// configuration errors.
    pub fn with_generator(mut self, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        if generator.is_some() {
            self.config_errors = Arc::new(Vec::new());
        }
        self.generator = generator;
        self
    }

    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig::from_settings(&self.settings)
    }

    /// Start a conversation and register it as a session
    pub fn create_conversation(&self) -> Result<Arc<Session>, ServerError> {
        let conversation = FirConversation::with_config_errors(
            self.domain.clone(),
            self.generator.clone(),
            self.conversation_config(),
            &self.config_errors,
        );
        self.sessions.insert(conversation)
    }
}
