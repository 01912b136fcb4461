//! Conversation controller
//!
//! Drives one FIR conversation: each user turn is extracted, merged into the
//! accumulated tags, reconciled into the form, classified and answered.
//! Turns are serialized; direct field edits may arrive at any time and are
//! never overwritten by a turn in flight.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use fir_assist_config::{DomainConfig, Settings};
use fir_assist_core::{
    Classification, ConversationTurn, FieldStatus, FormField, FormState, ProviderHealth, TagSet,
    Taxonomy, TextGenerator,
};

use crate::classifier::LegalClassifier;
use crate::extraction::{ExtractionSource, ExtractorConfig, TagExtractor};
use crate::mapper::FieldMapper;
use crate::reply::{ReplyGenerator, APOLOGY};
use crate::AgentError;

/// Conversation configuration
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Preceding turns given to the extractor as context
    pub history_window: usize,
    /// Classify after every turn; otherwise only on [`FirConversation::refresh_classification`]
    pub classify_every_turn: bool,
    /// Bound on each provider call
    pub timeout: Duration,
    pub enable_fallback: bool,
    /// Opening assistant message
    pub greeting: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            classify_every_turn: true,
            timeout: Duration::from_secs(20),
            enable_fallback: true,
            greeting: None,
        }
    }
}

impl ConversationConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let greeting = settings.conversation.greeting.trim();
        Self {
            history_window: settings.conversation.history_window,
            classify_every_turn: settings.conversation.classify_every_turn,
            timeout: settings.provider.timeout(),
            enable_fallback: settings.provider.enable_fallback,
            greeting: (!greeting.is_empty()).then(|| greeting.to_string()),
        }
    }
}

/// Conversation events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    TurnStarted { utterance: String },
    TagsExtracted { count: usize, source: ExtractionSource },
    /// Tags outside the taxonomy, kept out of the form and the rules
    TagsQuarantined { tags: TagSet },
    FieldsUpdated { fields: Vec<FormField> },
    Classified { classification: Classification },
    Replied { text: String },
    FieldEdited { field: FormField, value: String },
    Failed { error: String },
}

/// Result of one submitted utterance
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    /// Known tags extracted this turn
    pub extracted: usize,
    pub extraction_source: Option<ExtractionSource>,
    /// Extraction provider failed and keywords were used
    pub extraction_fallback: bool,
    /// Classification provider failed and the rule table was used
    pub classification_fallback: bool,
    pub fields_updated: Vec<FormField>,
    pub classification: Option<Classification>,
    pub failed: bool,
}

impl TurnOutcome {
    fn failure() -> Self {
        Self {
            reply: APOLOGY.to_string(),
            extracted: 0,
            extraction_source: None,
            extraction_fallback: false,
            classification_fallback: false,
            fields_updated: Vec::new(),
            classification: None,
            failed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    /// Share of required form fields filled, 0–100
    pub percentage: u8,
    pub fields: Vec<FieldStatus>,
    /// One entry per taxonomy category
    pub categories: Vec<FieldStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub form: FormState,
    pub tags: TagSet,
    pub quarantined: TagSet,
    pub classification: Option<Classification>,
    pub health: ProviderHealth,
    pub history: Vec<ConversationTurn>,
    pub completion: CompletionReport,
}

#[derive(Debug, Default)]
struct State {
    form: FormState,
    tags: TagSet,
    quarantined: TagSet,
    history: Vec<ConversationTurn>,
    classification: Option<Classification>,
    health: ProviderHealth,
}

const TURN_CANCELLED: &str = "Turn cancelled before completion";

/// Fails the turn on drop unless disarmed, so a cancelled turn never leaves
/// health in `processing`.
struct TurnGuard<'a> {
    conversation: &'a FirConversation,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    fn new(conversation: &'a FirConversation) -> Self {
        Self {
            conversation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.conversation.abandon_turn();
        }
    }
}

pub struct FirConversation {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: ConversationConfig,
    taxonomy: Arc<Taxonomy>,
    extractor: TagExtractor,
    mapper: FieldMapper,
    classifier: LegalClassifier,
    replies: ReplyGenerator,
    state: RwLock<State>,
    /// Serializes turns; waiters are served in order
    turn_lock: Mutex<()>,
    event_tx: broadcast::Sender<ConversationEvent>,
}

impl FirConversation {
    pub fn new(
        domain: Arc<DomainConfig>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: ConversationConfig,
    ) -> Self {
        Self::with_config_errors(domain, generator, config, &[])
    }

    /// Start a conversation whose provider configuration failed validation.
    /// Health starts in the error state with the messages recorded.
    pub fn with_config_errors(
        domain: Arc<DomainConfig>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: ConversationConfig,
        config_errors: &[String],
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let taxonomy = Arc::new(domain.taxonomy.clone());

        let extractor = TagExtractor::new(taxonomy.clone(), generator.clone()).with_config(
            ExtractorConfig {
                timeout: config.timeout,
                history_window: config.history_window,
                enable_fallback: config.enable_fallback,
            },
        );
        let classifier = LegalClassifier::new(domain, generator).with_timeout(config.timeout);

        let mut state = State {
            health: ProviderHealth::from_config_errors(config_errors),
            ..Default::default()
        };
        if let Some(greeting) = &config.greeting {
            state.history.push(ConversationTurn::assistant(greeting.clone()));
        }

        let id = Uuid::new_v4();
        tracing::debug!(conversation = %id, provider = extractor.has_provider(), "Conversation created");

        Self {
            id,
            created_at: Utc::now(),
            config,
            mapper: FieldMapper::new(taxonomy.clone()),
            taxonomy,
            extractor,
            classifier,
            replies: ReplyGenerator::new(),
            state: RwLock::new(state),
            turn_lock: Mutex::new(()),
            event_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Process one user utterance.
    ///
    /// Only an empty utterance is rejected. Any failure after that yields the
    /// apology reply and flips health to error; mutations already committed
    /// during the turn are kept.
    pub async fn submit_utterance(&self, text: &str) -> Result<TurnOutcome, AgentError> {
        let utterance = text.trim();
        if utterance.is_empty() {
            return Err(AgentError::EmptyUtterance);
        }

        let _turn = self.turn_lock.lock().await;

        let context = {
            let mut state = self.state.write();
            state.health.begin_turn();
            let start = state.history.len().saturating_sub(self.config.history_window);
            let context = state.history[start..].to_vec();
            state.history.push(ConversationTurn::user(utterance));
            context
        };
        self.emit(ConversationEvent::TurnStarted {
            utterance: utterance.to_string(),
        });

        let mut guard = TurnGuard::new(self);
        let result = self.run_turn(utterance, &context).await;
        guard.disarm();

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(conversation = %self.id, error = %e, "Turn failed");
                {
                    let mut state = self.state.write();
                    state.history.push(ConversationTurn::assistant(APOLOGY));
                    state.health.fail_turn(e.to_string());
                }
                self.emit(ConversationEvent::Failed {
                    error: e.to_string(),
                });
                Ok(TurnOutcome::failure())
            },
        }
    }

    /// Close a turn whose future was dropped before it finished
    fn abandon_turn(&self) {
        tracing::warn!(conversation = %self.id, "Turn cancelled before completion");
        {
            let mut state = self.state.write();
            state.history.push(ConversationTurn::assistant(APOLOGY));
            state.health.fail_turn(TURN_CANCELLED);
        }
        self.emit(ConversationEvent::Failed {
            error: TURN_CANCELLED.to_string(),
        });
    }

    async fn run_turn(
        &self,
        utterance: &str,
        context: &[ConversationTurn],
    ) -> Result<TurnOutcome, AgentError> {
        let extraction = self.extractor.extract(utterance, context).await?;

        let (known, unknown) = self.taxonomy.partition(&extraction.tags);
        if !unknown.is_empty() {
            tracing::warn!(
                conversation = %self.id,
                count = unknown.len(),
                "Quarantined tags outside the taxonomy"
            );
            self.emit(ConversationEvent::TagsQuarantined {
                tags: unknown.clone(),
            });
        }
        self.emit(ConversationEvent::TagsExtracted {
            count: known.len(),
            source: extraction.source,
        });

        // Reconcile against the live form so a concurrent edit is respected
        let (before, after, tags) = {
            let mut state = self.state.write();
            if let Some(e) = &extraction.provider_error {
                state.health.record_error(e.to_string());
            }
            state.quarantined.merge(&unknown);
            state.tags.merge(&known);
            let before = state.form.clone();
            let after = self.mapper.reconcile(&before, &state.tags, utterance);
            state.form = after.clone();
            (before, after, state.tags.clone())
        };

        let fields_updated = after.changed_fields(&before);
        if !fields_updated.is_empty() {
            tracing::debug!(conversation = %self.id, fields = fields_updated.len(), "Form updated");
            self.emit(ConversationEvent::FieldsUpdated {
                fields: fields_updated.clone(),
            });
        }

        let mut classification_fallback = false;
        let classification = if self.config.classify_every_turn {
            let (classification, error) = self.classifier.classify_with_diagnostics(&tags).await;
            classification_fallback = error.is_some();
            self.store_classification(&classification, error);
            Some(classification)
        } else {
            None
        };

        let reply = self
            .replies
            .reply(utterance, &before, &after, known.len());
        {
            let mut state = self.state.write();
            state.history.push(ConversationTurn::assistant(reply.clone()));
            state.health.complete_turn();
        }
        self.emit(ConversationEvent::Replied { text: reply.clone() });

        Ok(TurnOutcome {
            reply,
            extracted: known.len(),
            extraction_source: Some(extraction.source),
            extraction_fallback: extraction.provider_error.is_some(),
            classification_fallback,
            fields_updated,
            classification,
            failed: false,
        })
    }

    fn store_classification(
        &self,
        classification: &Classification,
        error: Option<fir_assist_core::Error>,
    ) {
        {
            let mut state = self.state.write();
            if let Some(e) = error {
                state.health.record_error(e.to_string());
            }
            state.classification = Some(classification.clone());
        }
        self.emit(ConversationEvent::Classified {
            classification: classification.clone(),
        });
    }

    /// Direct user edit of one form field. The value always wins and the field
    /// is pinned against later automatic population.
    pub fn edit_field(&self, section: &str, field: &str, value: &str) -> Result<FormState, AgentError> {
        let field = FormField::parse(section, field)?;
        let value = value.trim().to_string();

        let form = {
            let mut state = self.state.write();
            state.form.edit(field, value.clone());
            state.form.clone()
        };
        tracing::debug!(conversation = %self.id, field = %field, "Field edited by user");
        self.emit(ConversationEvent::FieldEdited { field, value });
        Ok(form)
    }

    /// Classify the accumulated tags now, waiting for any turn in flight
    pub async fn refresh_classification(&self) -> Classification {
        let _turn = self.turn_lock.lock().await;
        let tags = self.tag_set();
        let (classification, error) = self.classifier.classify_with_diagnostics(&tags).await;
        self.store_classification(&classification, error);
        classification
    }

    pub fn form_state(&self) -> FormState {
        self.state.read().form.clone()
    }

    pub fn tag_set(&self) -> TagSet {
        self.state.read().tags.clone()
    }

    pub fn quarantined(&self) -> TagSet {
        self.state.read().quarantined.clone()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.state.read().classification.clone()
    }

    pub fn provider_health(&self) -> ProviderHealth {
        self.state.read().health.clone()
    }

    pub fn history(&self) -> Vec<ConversationTurn> {
        self.state.read().history.clone()
    }

    pub fn completion(&self) -> CompletionReport {
        let state = self.state.read();
        self.completion_of(&state)
    }

    fn completion_of(&self, state: &State) -> CompletionReport {
        let categories = self
            .taxonomy
            .definitions()
            .iter()
            .map(|def| {
                let tags = self.taxonomy.ordered_tags(&state.tags, &def.category);
                FieldStatus {
                    key: def.category.clone(),
                    title: def.display_title(),
                    value: (!tags.is_empty()).then(|| tags.join(", ")),
                    completed: !tags.is_empty(),
                }
            })
            .collect();

        CompletionReport {
            percentage: state.form.completion_percentage(),
            fields: state.form.field_statuses(),
            categories,
        }
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.state.read();
        ConversationSnapshot {
            id: self.id,
            created_at: self.created_at,
            form: state.form.clone(),
            tags: state.tags.clone(),
            quarantined: state.quarantined.clone(),
            classification: state.classification.clone(),
            health: state.health.clone(),
            history: state.history.clone(),
            completion: self.completion_of(&state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fir_assist_core::{ProviderStatus, SeverityTier};

    fn conversation(config: ConversationConfig) -> FirConversation {
        FirConversation::new(Arc::new(DomainConfig::reference()), None, config)
    }

    #[tokio::test]
    async fn test_empty_utterance_rejected() {
        let conv = conversation(ConversationConfig::default());
        assert!(matches!(
            conv.submit_utterance("   ").await,
            Err(AgentError::EmptyUtterance)
        ));
        assert!(conv.history().is_empty());
    }

    #[tokio::test]
    async fn test_turn_appends_history_and_classifies() {
        let conv = conversation(ConversationConfig::default());
        let outcome = conv
            .submit_utterance("Someone broke into my house and stole my laptop")
            .await
            .unwrap();

        assert!(!outcome.failed);
        assert_eq!(outcome.extraction_source, Some(ExtractionSource::Keywords));
        assert!(outcome.extracted > 0);
        assert!(outcome.reply.starts_with("I've extracted"));

        let history = conv.history();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_user());
        assert_eq!(history[1].text, outcome.reply);

        let classification = conv.classification().unwrap();
        assert!(classification.section_count() >= 3);
        assert_eq!(conv.provider_health().status, ProviderStatus::Ready);
    }

    #[tokio::test]
    async fn test_classification_on_demand() {
        let conv = conversation(ConversationConfig {
            classify_every_turn: false,
            ..Default::default()
        });
        let outcome = conv.submit_utterance("A thief stole my bag").await.unwrap();
        assert!(outcome.classification.is_none());
        assert!(conv.classification().is_none());

        let classification = conv.refresh_classification().await;
        assert_eq!(classification.severity_tier, SeverityTier::Low);
        assert_eq!(conv.classification(), Some(classification));
    }

    #[tokio::test]
    async fn test_greeting_opens_history() {
        let conv = conversation(ConversationConfig {
            greeting: Some("Hello!".to_string()),
            ..Default::default()
        });
        let history = conv.history();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_user());
    }

    #[tokio::test]
    async fn test_edit_field_rejects_unknown() {
        let conv = conversation(ConversationConfig::default());
        assert!(conv.edit_field("incident", "weather", "rainy").is_err());
        let form = conv.edit_field("complainant", "name", " Asha ").unwrap();
        assert_eq!(form.get(FormField::ComplainantName), Some("Asha"));
    }

    #[tokio::test]
    async fn test_completion_report() {
        let conv = conversation(ConversationConfig::default());
        conv.submit_utterance("They robbed my house at night").await.unwrap();

        let report = conv.completion();
        assert_eq!(report.fields.len(), FormField::ALL.len());
        assert_eq!(report.categories.len(), 7);
        let location = report.categories.iter().find(|c| c.key == "location").unwrap();
        assert_eq!(location.value.as_deref(), Some("house, residence"));
        assert!(report.percentage > 0);
    }
}
