//! Tag extraction from user utterances
//!
//! The provider is asked for a JSON object keyed by taxonomy category. Any
//! failure (transport, non-2xx status, timeout, unparseable output) falls
//! back to [`KeywordExtractor`] on the same utterance.

mod keywords;

pub use keywords::{KeywordExtractor, KeywordRule, Trigger, KEYWORD_RULES};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use fir_assist_core::{ConversationTurn, Error, TagSet, Taxonomy, TextGenerator};
use fir_assist_llm::{parse_json_object, LlmError};

use crate::prompts::build_extraction_prompt;
use crate::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Provider,
    Keywords,
}

/// Result of one extraction. `tags` is unfiltered: tags outside the taxonomy
/// are left for the caller to quarantine.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub tags: TagSet,
    pub source: ExtractionSource,
    /// Provider failure that was recovered by the keyword fallback
    pub provider_error: Option<Error>,
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub timeout: Duration,
    /// Number of preceding turns sent as context
    pub history_window: usize,
    pub enable_fallback: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            history_window: 5,
            enable_fallback: true,
        }
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Parse a provider reply into a tag set. Missing categories are empty,
/// non-array category values are ignored.
pub fn parse_extraction_response(text: &str) -> Result<TagSet, LlmError> {
    let map = parse_json_object(text)?;
    let mut tags = TagSet::new();

    for (category, value) in &map {
        let category = normalize(category);
        match value {
            Value::Array(items) => {
                for tag in items.iter().filter_map(Value::as_str) {
                    tags.insert(&category, &normalize(tag));
                }
            },
            Value::Null => {},
            _ => {
                tracing::warn!(category = %category, "Ignoring non-array category in extraction reply");
            },
        }
    }

    Ok(tags)
}

pub struct TagExtractor {
    generator: Option<Arc<dyn TextGenerator>>,
    taxonomy: Arc<Taxonomy>,
    keywords: KeywordExtractor,
    config: ExtractorConfig,
}

impl TagExtractor {
    pub fn new(taxonomy: Arc<Taxonomy>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            generator,
            taxonomy,
            keywords: KeywordExtractor::default(),
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.generator.is_some()
    }

    /// Extract tags from `utterance`, given the turns that preceded it
    pub async fn extract(
        &self,
        utterance: &str,
        history: &[ConversationTurn],
    ) -> Result<Extraction, AgentError> {
        let Some(generator) = &self.generator else {
            return Ok(self.keyword_extraction(utterance, None));
        };

        let start = history.len().saturating_sub(self.config.history_window);
        let prompt = build_extraction_prompt(utterance, &history[start..], &self.taxonomy);

        match self.query_provider(generator.as_ref(), &prompt).await {
            Ok(tags) => {
                tracing::debug!(
                    provider = generator.provider_name(),
                    tags = tags.len(),
                    "Extracted tags from provider"
                );
                Ok(Extraction {
                    tags,
                    source: ExtractionSource::Provider,
                    provider_error: None,
                })
            },
            Err(e) if self.config.enable_fallback => {
                tracing::warn!(
                    provider = generator.provider_name(),
                    error = %e,
                    "Provider extraction failed, using keyword fallback"
                );
                Ok(self.keyword_extraction(utterance, Some(e)))
            },
            Err(e) => {
                tracing::error!(error = %e, "Provider extraction failed and fallback is disabled");
                Err(AgentError::Extraction(e))
            },
        }
    }

    async fn query_provider(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
    ) -> Result<TagSet, Error> {
        let text = tokio::time::timeout(self.config.timeout, generator.generate_text(prompt))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))??;
        Ok(parse_extraction_response(&text)?)
    }

    fn keyword_extraction(&self, utterance: &str, provider_error: Option<Error>) -> Extraction {
        let tags = self.keywords.extract(utterance);
        tracing::debug!(tags = tags.len(), "Extracted tags with keyword rules");
        Extraction {
            tags,
            source: ExtractionSource::Keywords,
            provider_error,
        }
    }
}
