//! Legal classification derived from a tag set

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(SeverityTier::Low),
            "medium" | "moderate" => Some(SeverityTier::Medium),
            "high" | "severe" => Some(SeverityTier::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableSection {
    pub label: String,
    pub justification: String,
}

/// Which path produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Provider,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub applicable_sections: Vec<ApplicableSection>,
    pub severity_tier: SeverityTier,
    pub recommendations: Vec<String>,
    /// Reasoning that supports the classification without adding a section
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punishment_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bailable: Option<bool>,
    pub source: ClassificationSource,
}

impl Classification {
    pub fn section_count(&self) -> usize {
        self.applicable_sections.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.applicable_sections
            .iter()
            .map(|s| s.label.as_str())
            .collect()
    }
}
