//! Traits for external collaborators

mod generation;
mod speech;

pub use generation::TextGenerator;
pub use speech::{SpeechCollaborator, SpeechErrorKind, SpeechEvent, SpeechOptions};
