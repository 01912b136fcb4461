//! Core traits and types for the FIR assistant
//!
//! This crate provides the foundational types shared by every other crate:
//! - Taxonomy and tag sets (the categorized facts extracted from a narration)
//! - Form state for the First Information Report
//! - Conversation turns, classification results and provider health
//! - Traits for pluggable collaborators (text generation, speech)
//! - Error types

pub mod classification;
pub mod conversation;
pub mod error;
pub mod form;
pub mod health;
pub mod tags;
pub mod taxonomy;
pub mod traits;

pub use classification::{ApplicableSection, Classification, ClassificationSource, SeverityTier};
pub use conversation::{ConversationTurn, Speaker};
pub use error::{Error, Result};
pub use form::{Complainant, FieldStatus, FormField, FormSection, FormState, Incident};
pub use health::{ProviderHealth, ProviderStatus, MAX_RECORDED_ERRORS};
pub use tags::TagSet;
pub use taxonomy::{categories, CategoryDef, Taxonomy};
pub use traits::{SpeechCollaborator, SpeechErrorKind, SpeechEvent, SpeechOptions, TextGenerator};
