//! Bridge between a speech collaborator and a conversation
//!
//! Recognition events arrive over a channel. Final transcripts are submitted
//! as user utterances; interim transcripts are only kept for display.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use fir_assist_core::{SpeechCollaborator, SpeechErrorKind, SpeechEvent, SpeechOptions};

use crate::conversation::{FirConversation, TurnOutcome};
use crate::AgentError;

pub struct SpeechBridge {
    conversation: Arc<FirConversation>,
    collaborator: Option<Arc<dyn SpeechCollaborator>>,
    options: SpeechOptions,
    /// Speak every assistant reply
    auto_speak: bool,
    interim: RwLock<String>,
    listening: AtomicBool,
    last_error: RwLock<Option<SpeechErrorKind>>,
}

impl SpeechBridge {
    pub fn new(
        conversation: Arc<FirConversation>,
        collaborator: Option<Arc<dyn SpeechCollaborator>>,
    ) -> Self {
        Self {
            conversation,
            collaborator,
            options: SpeechOptions::default(),
            auto_speak: false,
            interim: RwLock::new(String::new()),
            listening: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    pub fn with_options(mut self, options: SpeechOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_auto_speak(mut self, auto_speak: bool) -> Self {
        self.auto_speak = auto_speak;
        self
    }

    pub fn is_supported(&self) -> bool {
        self.collaborator
            .as_ref()
            .map(|c| c.is_supported())
            .unwrap_or(false)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn interim_transcript(&self) -> String {
        self.interim.read().clone()
    }

    pub fn last_error(&self) -> Option<SpeechErrorKind> {
        self.last_error.read().clone()
    }

    fn supported_collaborator(&self) -> Result<&Arc<dyn SpeechCollaborator>, AgentError> {
        self.collaborator
            .as_ref()
            .filter(|c| c.is_supported())
            .ok_or_else(|| AgentError::Speech("Speech recognition is not supported".to_string()))
    }

    pub fn start_listening(&self) -> Result<(), AgentError> {
        let collaborator = self.supported_collaborator()?;
        collaborator
            .start_listening()
            .map_err(|e| AgentError::Speech(e.to_string()))?;
        self.listening.store(true, Ordering::SeqCst);
        *self.last_error.write() = None;
        Ok(())
    }

    pub fn stop_listening(&self) {
        if let Some(collaborator) = &self.collaborator {
            collaborator.stop_listening();
        }
        self.listening.store(false, Ordering::SeqCst);
    }

    /// Apply one recognition event. Returns the turn outcome when a final
    /// transcript was submitted.
    pub async fn handle_event(&self, event: SpeechEvent) -> Result<Option<TurnOutcome>, AgentError> {
        match event {
            SpeechEvent::Started => {
                self.listening.store(true, Ordering::SeqCst);
                *self.last_error.write() = None;
                Ok(None)
            },
            SpeechEvent::InterimResult(text) => {
                *self.interim.write() = text;
                Ok(None)
            },
            SpeechEvent::FinalResult(text) => {
                self.interim.write().clear();
                if text.trim().is_empty() {
                    return Ok(None);
                }
                let outcome = self.conversation.submit_utterance(&text).await?;
                if self.auto_speak {
                    self.speak(&outcome.reply).await;
                }
                Ok(Some(outcome))
            },
            SpeechEvent::Ended => {
                self.listening.store(false, Ordering::SeqCst);
                self.interim.write().clear();
                Ok(None)
            },
            SpeechEvent::Error(kind) => {
                tracing::warn!(error = ?kind, "Speech recognition error");
                self.listening.store(false, Ordering::SeqCst);
                *self.last_error.write() = Some(kind);
                Ok(None)
            },
        }
    }

    async fn speak(&self, text: &str) {
        let Ok(collaborator) = self.supported_collaborator() else {
            return;
        };
        if let Err(e) = collaborator.speak(text, &self.options).await {
            tracing::warn!(error = %e, "Failed to speak reply");
        }
    }

    /// Consume events until the sender side closes. Returns the number of
    /// utterances submitted.
    pub async fn run(&self, mut events: mpsc::Receiver<SpeechEvent>) -> usize {
        let mut submitted = 0;
        while let Some(event) = events.recv().await {
            match self.handle_event(event).await {
                Ok(Some(_)) => submitted += 1,
                Ok(None) => {},
                Err(e) => tracing::warn!(error = %e, "Dropped speech transcript"),
            }
        }
        self.listening.store(false, Ordering::SeqCst);
        submitted
    }
}
