//! Domain configuration: taxonomy, legal rule table and classification thresholds
//!
//! Loaded from YAML (or TOML, by extension). Supporting a new jurisdiction
//! means writing a new file, not new code.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use fir_assist_core::{TagSet, Taxonomy};

use crate::ConfigError;

const REFERENCE_DOMAIN_YAML: &str = include_str!("../../../config/domain.yaml");

static REFERENCE_DOMAIN: Lazy<DomainConfig> = Lazy::new(|| {
    serde_yaml::from_str(REFERENCE_DOMAIN_YAML).expect("embedded domain config must parse")
});

/// A `category:tag` reference used by rule predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagRef {
    pub category: String,
    pub tag: String,
}

impl TagRef {
    pub fn new(category: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            tag: tag.into(),
        }
    }
}

impl TryFrom<String> for TagRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some((category, tag)) if !category.trim().is_empty() && !tag.trim().is_empty() => {
                Ok(TagRef::new(category.trim(), tag.trim()))
            },
            _ => Err(format!("expected `category:tag`, got `{}`", value)),
        }
    }
}

impl From<TagRef> for String {
    fn from(value: TagRef) -> Self {
        format!("{}:{}", value.category, value.tag)
    }
}

/// One row of the legal rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalRule {
    /// Section added when the rule fires; `None` for observation-only rules
    #[serde(default)]
    pub section: Option<String>,
    pub justification: String,
    /// Fires when any of these tags is present
    pub when_any: Vec<TagRef>,
}

impl LegalRule {
    pub fn matches(&self, tags: &TagSet) -> bool {
        self.when_any
            .iter()
            .any(|r| tags.contains(&r.category, &r.tag))
    }
}

/// Section-count thresholds for severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    #[serde(default = "default_high")]
    pub high: usize,
    #[serde(default = "default_medium")]
    pub medium: usize,
}

fn default_high() -> usize {
    4
}

fn default_medium() -> usize {
    2
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub legal_code: String,
    pub taxonomy: Taxonomy,
    #[serde(default)]
    pub legal_rules: Vec<LegalRule>,
    #[serde(default)]
    pub severity_thresholds: SeverityThresholds,
}

impl DomainConfig {
    /// The embedded reference configuration
    pub fn reference() -> DomainConfig {
        REFERENCE_DOMAIN.clone()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.taxonomy.is_empty() {
            return Err(ConfigError::MissingField("taxonomy".to_string()));
        }

        for (index, rule) in self.legal_rules.iter().enumerate() {
            if rule.when_any.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("legal_rules[{}].when_any", index),
                    message: "Rule needs at least one tag".to_string(),
                });
            }
            for tag in &rule.when_any {
                if !self.taxonomy.is_valid_tag(&tag.category, &tag.tag) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("legal_rules[{}].when_any", index),
                        message: format!(
                            "{}:{} is not in the taxonomy",
                            tag.category, tag.tag
                        ),
                    });
                }
            }
        }

        let thresholds = self.severity_thresholds;
        if thresholds.medium == 0 || thresholds.high <= thresholds.medium {
            return Err(ConfigError::InvalidValue {
                field: "severity_thresholds".to_string(),
                message: format!(
                    "Expected high > medium >= 1, got high={} medium={}",
                    thresholds.high, thresholds.medium
                ),
            });
        }

        Ok(())
    }
}

/// Load a domain configuration file. `.toml` files are parsed as TOML,
/// everything else as YAML.
pub fn load_domain_config(path: impl AsRef<Path>) -> Result<DomainConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

    let domain: DomainConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    domain.validate()?;

    tracing::info!(
        path = %path.display(),
        jurisdiction = %domain.jurisdiction,
        categories = domain.taxonomy.len(),
        rules = domain.legal_rules.len(),
        "Loaded domain configuration"
    );

    Ok(domain)
}
