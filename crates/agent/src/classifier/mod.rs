//! Legal classification of an accumulated tag set
//!
//! Provider first, grounded on the domain rule table in the prompt; the rule
//! table itself is evaluated whenever the provider is absent or fails. The
//! classifier is stateless: it only reads the tags it is given.

mod rules;

pub use rules::{classify_by_rules, recommendations_for, tier_for_section_count};

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use fir_assist_config::DomainConfig;
use fir_assist_core::{
    ApplicableSection, Classification, ClassificationSource, Error, SeverityTier, TagSet,
    TextGenerator,
};
use fir_assist_llm::{parse_json_object, LlmError};

use crate::prompts::build_classification_prompt;

fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn parse_section(item: &Value) -> Option<(String, Option<String>)> {
    let parsed = match item {
        Value::String(label) => Some((label.trim().to_string(), None)),
        Value::Object(map) => {
            let label = ["section", "label", "name"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))?;
            let justification = ["justification", "reasoning", "reason"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string);
            Some((label.trim().to_string(), justification))
        },
        _ => None,
    };
    parsed.filter(|(label, _)| !label.is_empty())
}

fn parse_bailable(map: &Map<String, Value>) -> Option<bool> {
    match map.get("bailable")? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "true" | "bailable" => Some(true),
            "no" | "false" | "non-bailable" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a provider reply. The object must carry an `applicable_sections`
/// array; `reasoning` entries pair with sections by position and any extra
/// entries become observations.
pub fn parse_classification_response(
    text: &str,
    domain: &DomainConfig,
) -> Result<Classification, LlmError> {
    let map = parse_json_object(text)?;

    let items = map
        .get("applicable_sections")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LlmError::InvalidResponse("missing applicable_sections array".to_string())
        })?;

    let mut reasoning = string_items(map.get("reasoning")).into_iter();
    let mut sections: Vec<ApplicableSection> = Vec::new();
    for (label, inline) in items.iter().filter_map(parse_section) {
        let positional = reasoning.next();
        if sections.iter().any(|s| s.label == label) {
            continue;
        }
        sections.push(ApplicableSection {
            label,
            justification: inline.or(positional).unwrap_or_default(),
        });
    }
    let observations: Vec<String> = reasoning.collect();

    let severity_tier = map
        .get("severity")
        .and_then(Value::as_str)
        .and_then(SeverityTier::from_str)
        .unwrap_or_else(|| tier_for_section_count(sections.len(), &domain.severity_thresholds));

    let mut recommendations = string_items(map.get("recommendations"));
    if recommendations.is_empty() {
        recommendations = recommendations_for(severity_tier);
    }

    let punishment_range = map
        .get("punishment_range")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Classification {
        applicable_sections: sections,
        severity_tier,
        recommendations,
        observations,
        punishment_range,
        bailable: parse_bailable(&map),
        source: ClassificationSource::Provider,
    })
}

pub struct LegalClassifier {
    domain: Arc<DomainConfig>,
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl LegalClassifier {
    pub fn new(domain: Arc<DomainConfig>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            domain,
            generator,
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    pub async fn classify(&self, tags: &TagSet) -> Classification {
        self.classify_with_diagnostics(tags).await.0
    }

    /// Classification plus the provider error, if the rule table had to stand in
    pub async fn classify_with_diagnostics(&self, tags: &TagSet) -> (Classification, Option<Error>) {
        let Some(generator) = &self.generator else {
            return (classify_by_rules(tags, &self.domain), None);
        };

        let prompt = build_classification_prompt(tags, &self.domain);
        match self.query_provider(generator.as_ref(), &prompt).await {
            Ok(classification) => {
                tracing::debug!(
                    provider = generator.provider_name(),
                    sections = classification.section_count(),
                    severity = %classification.severity_tier,
                    "Classified tags with provider"
                );
                (classification, None)
            },
            Err(e) => {
                tracing::warn!(
                    provider = generator.provider_name(),
                    error = %e,
                    "Provider classification failed, using rule table"
                );
                (classify_by_rules(tags, &self.domain), Some(e))
            },
        }
    }

    async fn query_provider(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
    ) -> Result<Classification, Error> {
        let text = tokio::time::timeout(self.timeout, generator.generate_text(prompt))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;
        Ok(parse_classification_response(&text, &self.domain)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(fir_assist_core::Result<String>);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate_text(&self, _prompt: &str) -> fir_assist_core::Result<String> {
            self.0.clone()
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    fn domain() -> Arc<DomainConfig> {
        Arc::new(DomainConfig::reference())
    }

    fn burglary() -> TagSet {
        [
            ("intent", "dishonest_intent_to_take"),
            ("method", "unauthorized_entry"),
            ("offender_attribute", "repeat_offender"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_parse_provider_reply() {
        let reply = r#"Analysis:
        {
          "applicable_sections": ["Section 378 - Theft", {"section": "Section 457", "justification": "Lurking house-trespass by night"}],
          "reasoning": ["Dishonest taking", "ignored for 457", "Offender was seen leaving"],
          "severity": "High",
          "recommendations": [],
          "punishment_range": "Up to 3 years",
          "bailable": "no"
        }"#;
        let result = parse_classification_response(reply, &DomainConfig::reference()).unwrap();

        assert_eq!(result.labels(), vec!["Section 378 - Theft", "Section 457"]);
        assert_eq!(result.applicable_sections[0].justification, "Dishonest taking");
        assert_eq!(
            result.applicable_sections[1].justification,
            "Lurking house-trespass by night"
        );
        assert_eq!(result.observations, vec!["Offender was seen leaving"]);
        assert_eq!(result.severity_tier, SeverityTier::High);
        assert_eq!(result.recommendations, recommendations_for(SeverityTier::High));
        assert_eq!(result.punishment_range.as_deref(), Some("Up to 3 years"));
        assert_eq!(result.bailable, Some(false));
        assert_eq!(result.source, ClassificationSource::Provider);
    }

    #[test]
    fn test_parse_requires_sections_array() {
        let domain = DomainConfig::reference();
        assert!(parse_classification_response(r#"{"severity": "low"}"#, &domain).is_err());
        assert!(
            parse_classification_response(r#"{"applicable_sections": "378"}"#, &domain).is_err()
        );
        assert!(parse_classification_response("[]", &domain).is_err());
    }

    #[test]
    fn test_unknown_severity_falls_back_to_count() {
        let result = parse_classification_response(
            r#"{"applicable_sections": ["A", "B"], "severity": "catastrophic"}"#,
            &DomainConfig::reference(),
        )
        .unwrap();
        assert_eq!(result.severity_tier, SeverityTier::Medium);
        assert_eq!(result.bailable, None);
    }

    #[tokio::test]
    async fn test_without_provider_uses_rules() {
        let classifier = LegalClassifier::new(domain(), None);
        let (result, error) = classifier.classify_with_diagnostics(&burglary()).await;
        assert_eq!(result.section_count(), 3);
        assert_eq!(result.severity_tier, SeverityTier::Medium);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_malformed_replies_fall_back() {
        for reply in ["", "not json at all", "[\"Section 378\"]", "{\"applicable_sections\": 3}"] {
            let classifier =
                LegalClassifier::new(domain(), Some(Arc::new(Fixed(Ok(reply.to_string())))));
            let (result, error) = classifier.classify_with_diagnostics(&burglary()).await;
            assert_eq!(result.source, ClassificationSource::Rules, "reply {:?}", reply);
            assert_eq!(result.section_count(), 3);
            assert!(matches!(error, Some(Error::Parse(_))));
        }
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let classifier = LegalClassifier::new(
            domain(),
            Some(Arc::new(Fixed(Err(Error::Provider("connection reset".into()))))),
        );
        let result = classifier.classify(&burglary()).await;
        assert_eq!(result.source, ClassificationSource::Rules);
    }

    #[tokio::test]
    async fn test_classification_is_idempotent() {
        let classifier = LegalClassifier::new(domain(), None);
        let tags = burglary();
        let first = classifier.classify(&tags).await;
        let second = classifier.classify(&tags).await;
        assert_eq!(first, second);
        assert_eq!(tags, burglary());
    }
}
