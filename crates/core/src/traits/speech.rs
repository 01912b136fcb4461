//! Speech collaborator interface
//!
//! Recognition results are delivered as [`SpeechEvent`]s over a channel. Only
//! final results are treated as user utterances; interim results exist for
//! display.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    NotAllowed,
    Network,
    Other(String),
}

impl SpeechErrorKind {
    /// Map a recognizer error code such as `no-speech` or `not-allowed`
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().replace('_', "-").as_str() {
            "no-speech" => SpeechErrorKind::NoSpeech,
            "aborted" => SpeechErrorKind::Aborted,
            "audio-capture" => SpeechErrorKind::AudioCapture,
            "not-allowed" | "service-not-allowed" => SpeechErrorKind::NotAllowed,
            "network" => SpeechErrorKind::Network,
            other => SpeechErrorKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SpeechEvent {
    Started,
    InterimResult(String),
    FinalResult(String),
    Ended,
    Error(SpeechErrorKind),
}

/// Voice options for speaking assistant replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

#[async_trait]
pub trait SpeechCollaborator: Send + Sync {
    fn is_supported(&self) -> bool;

    fn start_listening(&self) -> Result<()>;

    fn stop_listening(&self);

    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<()>;
}
