//! Conversational FIR assistant
//!
//! Features:
//! - Tag extraction from free-text utterances (provider first, keyword fallback)
//! - Form auto-population with fill-if-empty semantics
//! - Legal classification from accumulated tags (provider first, rule-table fallback)
//! - Turn orchestration with provider health tracking
//! - Speech event bridge feeding final transcripts into the conversation

pub mod classifier;
pub mod conversation;
pub mod extraction;
pub mod mapper;
pub mod prompts;
pub mod reply;
pub mod speech;

pub use classifier::{
    classify_by_rules, parse_classification_response, recommendations_for,
    tier_for_section_count, LegalClassifier,
};
pub use conversation::{
    CompletionReport, ConversationConfig, ConversationEvent, ConversationSnapshot,
    FirConversation, TurnOutcome,
};
pub use extraction::{
    parse_extraction_response, Extraction, ExtractionSource, KeywordExtractor, TagExtractor,
};
pub use mapper::{form_severity, FieldMapper, PatternRule, PATTERN_RULES};
pub use reply::{ReplyGenerator, APOLOGY, GENERIC_GUIDANCE};
pub use speech::SpeechBridge;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Utterance is empty")]
    EmptyUtterance,

    /// Provider failure with keyword fallback disabled
    #[error("Extraction failed: {0}")]
    Extraction(fir_assist_core::Error),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error(transparent)]
    Core(#[from] fir_assist_core::Error),
}

impl From<fir_assist_llm::LlmError> for AgentError {
    fn from(err: fir_assist_llm::LlmError) -> Self {
        AgentError::Core(err.into())
    }
}
