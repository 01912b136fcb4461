//! End-to-end conversation flows with scripted providers

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use fir_assist_agent::{
    ConversationConfig, ConversationEvent, ExtractionSource, FirConversation, SpeechBridge,
    APOLOGY,
};
use fir_assist_config::DomainConfig;
use fir_assist_core::{
    categories, ClassificationSource, Error, FormField, ProviderStatus, SeverityTier,
    SpeechCollaborator, SpeechErrorKind, SpeechEvent, SpeechOptions, TextGenerator,
};

const NARRATION: &str = "Someone broke into my house at night without permission and stole my \
                         laptop. I'm the owner and this person has done this before.";

/// Replies from a queue; `Err` once the queue is empty
struct Queued {
    replies: Mutex<Vec<fir_assist_core::Result<String>>>,
}

impl Queued {
    fn new(mut replies: Vec<fir_assist_core::Result<String>>) -> Arc<Self> {
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
        })
    }
}

#[async_trait]
impl TextGenerator for Queued {
    async fn generate_text(&self, _prompt: &str) -> fir_assist_core::Result<String> {
        self.replies
            .lock()
            .pop()
            .unwrap_or_else(|| Err(Error::Provider("no scripted reply left".into())))
    }

    fn provider_name(&self) -> &str {
        "queued"
    }
}

struct Slow;

#[async_trait]
impl TextGenerator for Slow {
    async fn generate_text(&self, _prompt: &str) -> fir_assist_core::Result<String> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(r#"{"intent": ["dishonest_intent_to_take"]}"#.to_string())
    }

    fn provider_name(&self) -> &str {
        "slow"
    }
}

/// Never answers the first call; later calls fail fast
#[derive(Default)]
struct StallsOnce {
    calls: Mutex<usize>,
}

#[async_trait]
impl TextGenerator for StallsOnce {
    async fn generate_text(&self, _prompt: &str) -> fir_assist_core::Result<String> {
        let first = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls == 1
        };
        if first {
            std::future::pending::<()>().await;
        }
        Err(Error::Provider("connection refused".into()))
    }

    fn provider_name(&self) -> &str {
        "stalls-once"
    }
}

#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechCollaborator for RecordingSpeaker {
    fn is_supported(&self) -> bool {
        true
    }

    fn start_listening(&self) -> fir_assist_core::Result<()> {
        Ok(())
    }

    fn stop_listening(&self) {}

    async fn speak(&self, text: &str, _options: &SpeechOptions) -> fir_assist_core::Result<()> {
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

fn domain() -> Arc<DomainConfig> {
    Arc::new(DomainConfig::reference())
}

#[tokio::test]
async fn test_burglary_narration_with_keyword_extraction() {
    let conv = FirConversation::new(domain(), None, ConversationConfig::default());
    conv.submit_utterance(NARRATION).await.unwrap();

    let tags = conv.tag_set();
    assert!(tags.contains(categories::INTENT, "dishonest_intent_to_take"));
    assert!(tags.contains(categories::METHOD, "unauthorized_entry"));
    assert!(tags.contains(categories::LOCATION, "house"));
    assert!(tags.contains(categories::LOCATION, "residence"));
    assert!(tags.contains(categories::TIME, "night_time"));
    assert!(tags.contains(categories::TIME, "sunset_to_sunrise"));
    assert!(tags.contains(categories::VICTIM_CONTEXT, "house_owner"));
    assert!(tags.contains(categories::OFFENDER_ATTRIBUTE, "repeat_offender"));

    let form = conv.form_state();
    assert_eq!(form.get(FormField::IncidentType), Some("Theft"));
    assert_eq!(form.get(FormField::IncidentTime), Some("Night time"));
    assert_eq!(form.get(FormField::IncidentSeverity), Some("High"));

    let classification = conv.classification().unwrap();
    assert_eq!(classification.source, ClassificationSource::Rules);
    assert_eq!(classification.severity_tier, SeverityTier::High);
    assert!(classification
        .labels()
        .contains(&"Section 380 - Theft in dwelling house"));
}

#[tokio::test]
async fn test_provider_tags_are_merged_across_turns() {
    let generator = Queued::new(vec![
        Ok(r#"{"intent": ["dishonest_intent_to_take"], "location": ["house"]}"#.into()),
        Ok(r#"{"applicable_sections": ["Section 378 - Theft"], "severity": "low"}"#.into()),
        Ok(r#"{"time": ["night_time"]}"#.into()),
        Ok("not json".into()),
    ]);
    let conv = FirConversation::new(domain(), Some(generator), ConversationConfig::default());

    let first = conv.submit_utterance("My things were taken from home").await.unwrap();
    assert_eq!(first.extraction_source, Some(ExtractionSource::Provider));
    assert_eq!(
        first.classification.as_ref().map(|c| c.source),
        Some(ClassificationSource::Provider)
    );

    let second = conv.submit_utterance("It was late").await.unwrap();
    assert!(second.classification_fallback);

    let tags = conv.tag_set();
    assert!(tags.contains("intent", "dishonest_intent_to_take"));
    assert!(tags.contains("location", "house"));
    assert!(tags.contains("time", "night_time"));

    // A recovered failure is recorded without leaving the ready state
    let health = conv.provider_health();
    assert_eq!(health.status, ProviderStatus::Ready);
    assert_eq!(health.last_errors.len(), 1);
}

#[tokio::test]
async fn test_user_edited_location_persists() {
    let conv = FirConversation::new(domain(), None, ConversationConfig::default());
    conv.edit_field("incident", "location", "Platform 3, Central Station")
        .unwrap();

    conv.submit_utterance(NARRATION).await.unwrap();
    conv.submit_utterance("They also took jewellery from the flat on the road")
        .await
        .unwrap();

    assert_eq!(
        conv.form_state().get(FormField::IncidentLocation),
        Some("Platform 3, Central Station")
    );
}

#[tokio::test]
async fn test_incident_type_never_changes_once_set() {
    let conv = FirConversation::new(domain(), None, ConversationConfig::default());
    conv.submit_utterance("A thief stole my phone").await.unwrap();
    conv.submit_utterance("He also tried to scam me and attacked me")
        .await
        .unwrap();
    assert_eq!(conv.form_state().get(FormField::IncidentType), Some("Theft"));
}

#[tokio::test]
async fn test_fallback_disabled_produces_apology() {
    let generator = Queued::new(vec![Err(Error::ProviderStatus {
        status: 503,
        body: "unavailable".into(),
    })]);
    let conv = FirConversation::new(
        domain(),
        Some(generator),
        ConversationConfig {
            enable_fallback: false,
            ..Default::default()
        },
    );
    let mut events = conv.subscribe();

    let outcome = conv.submit_utterance(NARRATION).await.unwrap();
    assert!(outcome.failed);
    assert_eq!(outcome.reply, APOLOGY);

    let health = conv.provider_health();
    assert_eq!(health.status, ProviderStatus::Error);
    assert_eq!(health.last_errors.len(), 1);

    // The user turn stays committed
    let history = conv.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].text, NARRATION);
    assert_eq!(history[1].text, APOLOGY);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ConversationEvent::Failed { .. }) {
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn test_error_recovers_on_next_turn() {
    let generator = Queued::new(vec![
        Err(Error::Provider("connection refused".into())),
        Ok(r#"{"intent": ["dishonest_intent_to_take"]}"#.into()),
    ]);
    let conv = FirConversation::new(
        domain(),
        Some(generator),
        ConversationConfig {
            enable_fallback: false,
            classify_every_turn: false,
            ..Default::default()
        },
    );

    assert!(conv.submit_utterance("first").await.unwrap().failed);
    assert_eq!(conv.provider_health().status, ProviderStatus::Error);

    assert!(!conv.submit_utterance("second").await.unwrap().failed);
    assert_eq!(conv.provider_health().status, ProviderStatus::Ready);
}

#[tokio::test]
async fn test_out_of_taxonomy_tags_are_quarantined() {
    let generator = Queued::new(vec![Ok(
        r#"{"intent": ["dishonest_intent_to_take", "world_domination"], "mood": ["angry"]}"#.into(),
    )]);
    let conv = FirConversation::new(
        domain(),
        Some(generator),
        ConversationConfig {
            classify_every_turn: false,
            ..Default::default()
        },
    );

    let outcome = conv.submit_utterance("They took it").await.unwrap();
    assert_eq!(outcome.extracted, 1);

    assert_eq!(conv.tag_set().len(), 1);
    let quarantined = conv.quarantined();
    assert!(quarantined.contains("intent", "world_domination"));
    assert!(quarantined.contains("mood", "angry"));
}

#[tokio::test]
async fn test_config_errors_start_in_error_state() {
    let conv = FirConversation::with_config_errors(
        domain(),
        None,
        ConversationConfig::default(),
        &["OpenAI API key is required".to_string()],
    );
    let health = conv.provider_health();
    assert_eq!(health.status, ProviderStatus::Error);
    assert_eq!(health.last_errors, vec!["OpenAI API key is required".to_string()]);

    // Keyword fallback still works
    let outcome = conv.submit_utterance(NARRATION).await.unwrap();
    assert!(!outcome.failed);
    assert_eq!(conv.provider_health().status, ProviderStatus::Ready);
}

#[tokio::test]
async fn test_turns_are_serialized() {
    let conv = Arc::new(FirConversation::new(
        domain(),
        Some(Arc::new(Slow)),
        ConversationConfig {
            classify_every_turn: false,
            ..Default::default()
        },
    ));

    let a = tokio::spawn({
        let conv = conv.clone();
        async move { conv.submit_utterance("first utterance").await }
    });
    let b = tokio::spawn({
        let conv = conv.clone();
        async move { conv.submit_utterance("second utterance").await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // Every user turn is immediately followed by its reply
    let history = conv.history();
    assert_eq!(history.len(), 4);
    assert!(history[0].is_user());
    assert!(!history[1].is_user());
    assert!(history[2].is_user());
    assert!(!history[3].is_user());
}

#[tokio::test]
async fn test_speech_bridge_submits_final_results_only() {
    let conv = Arc::new(FirConversation::new(domain(), None, ConversationConfig::default()));
    let speaker = Arc::new(RecordingSpeaker::default());
    let bridge = SpeechBridge::new(conv.clone(), Some(speaker.clone())).with_auto_speak(true);

    let (tx, rx) = mpsc::channel(16);
    tx.send(SpeechEvent::Started).await.unwrap();
    tx.send(SpeechEvent::InterimResult("someone broke".into()))
        .await
        .unwrap();
    tx.send(SpeechEvent::FinalResult("Someone broke into my house".into()))
        .await
        .unwrap();
    tx.send(SpeechEvent::Error(SpeechErrorKind::NoSpeech))
        .await
        .unwrap();
    tx.send(SpeechEvent::Ended).await.unwrap();
    drop(tx);

    assert_eq!(bridge.run(rx).await, 1);
    assert_eq!(conv.history().len(), 2);
    assert!(bridge.interim_transcript().is_empty());
    assert_eq!(bridge.last_error(), Some(SpeechErrorKind::NoSpeech));
    assert!(!bridge.is_listening());

    let spoken = speaker.spoken.lock();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0], conv.history()[1].text);
}

#[tokio::test]
async fn test_speech_bridge_without_support() {
    let conv = Arc::new(FirConversation::new(domain(), None, ConversationConfig::default()));
    let bridge = SpeechBridge::new(conv, None);
    assert!(!bridge.is_supported());
    assert!(bridge.start_listening().is_err());

    bridge
        .handle_event(SpeechEvent::InterimResult("partial".into()))
        .await
        .unwrap();
    assert_eq!(bridge.interim_transcript(), "partial");
}

#[tokio::test]
async fn test_cancelled_turn_does_not_leave_health_processing() {
    let conv = FirConversation::new(
        domain(),
        Some(Arc::new(StallsOnce::default())),
        ConversationConfig::default(),
    );
    let mut events = conv.subscribe();

    let dropped =
        tokio::time::timeout(Duration::from_millis(100), conv.submit_utterance("they stole my bike"))
            .await;
    assert!(dropped.is_err());

    let health = conv.provider_health();
    assert_eq!(health.status, ProviderStatus::Error);
    assert!(health.last_errors.iter().any(|e| e.contains("cancelled")));

    let history = conv.history();
    assert_eq!(history.len(), 2);
    assert!(history[0].is_user());
    assert_eq!(history[1].text, APOLOGY);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        saw_failure |= matches!(event, ConversationEvent::Failed { .. });
    }
    assert!(saw_failure);

    // The turn lock was released and the next turn recovers
    let outcome = conv.submit_utterance("someone stole my phone at night").await.unwrap();
    assert!(!outcome.failed);
    assert_eq!(outcome.extraction_source, Some(ExtractionSource::Keywords));
    assert_eq!(conv.provider_health().status, ProviderStatus::Ready);
    assert_eq!(conv.history().len(), 4);
}
