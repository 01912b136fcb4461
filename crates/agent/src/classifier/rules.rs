//! Rule-table classification

use fir_assist_config::{DomainConfig, SeverityThresholds};
use fir_assist_core::{
    ApplicableSection, Classification, ClassificationSource, SeverityTier, TagSet,
};

/// Severity tier from the number of applicable sections
pub fn tier_for_section_count(count: usize, thresholds: &SeverityThresholds) -> SeverityTier {
    if count >= thresholds.high {
        SeverityTier::High
    } else if count >= thresholds.medium {
        SeverityTier::Medium
    } else {
        SeverityTier::Low
    }
}

pub fn recommendations_for(tier: SeverityTier) -> Vec<String> {
    let items: &[&str] = match tier {
        SeverityTier::High => &[
            "Consider non-bailable offense",
            "Immediate investigation required",
        ],
        SeverityTier::Medium => &["Standard investigation procedures"],
        SeverityTier::Low => &["Basic investigation sufficient"],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Evaluate the domain rule table in order. Each rule is independent and adds
/// at most one section, so two rules naming the same section both count
/// toward the tier.
pub fn classify_by_rules(tags: &TagSet, domain: &DomainConfig) -> Classification {
    let mut sections: Vec<ApplicableSection> = Vec::new();
    let mut observations = Vec::new();

    for rule in domain.legal_rules.iter().filter(|r| r.matches(tags)) {
        match &rule.section {
            Some(label) => sections.push(ApplicableSection {
                label: label.clone(),
                justification: rule.justification.clone(),
            }),
            None => observations.push(rule.justification.clone()),
        }
    }

    let tier = tier_for_section_count(sections.len(), &domain.severity_thresholds);
    let code = if domain.legal_code.is_empty() {
        "applicable law"
    } else {
        domain.legal_code.as_str()
    };

    Classification {
        applicable_sections: sections,
        severity_tier: tier,
        recommendations: recommendations_for(tier),
        observations,
        punishment_range: Some(format!("Standard punishment as per {}", code)),
        bailable: Some(tier != SeverityTier::High),
        source: ClassificationSource::Rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_tiering() {
        let thresholds = SeverityThresholds::default();
        assert_eq!(tier_for_section_count(0, &thresholds), SeverityTier::Low);
        assert_eq!(tier_for_section_count(1, &thresholds), SeverityTier::Low);
        assert_eq!(tier_for_section_count(2, &thresholds), SeverityTier::Medium);
        assert_eq!(tier_for_section_count(3, &thresholds), SeverityTier::Medium);
        assert_eq!(tier_for_section_count(4, &thresholds), SeverityTier::High);

        let strict = SeverityThresholds { high: 2, medium: 1 };
        assert_eq!(tier_for_section_count(1, &strict), SeverityTier::Medium);
    }

    #[test]
    fn test_three_sections_is_medium() {
        let domain = DomainConfig::reference();
        let result = classify_by_rules(
            &tags(&[
                ("intent", "dishonest_intent_to_take"),
                ("method", "unauthorized_entry"),
                ("offender_attribute", "repeat_offender"),
            ]),
            &domain,
        );
        assert_eq!(
            result.labels(),
            vec![
                "Section 378 - Theft",
                "Section 451 - House-trespass",
                "Section 75 - Enhanced punishment for repeat offenders",
            ]
        );
        assert_eq!(result.severity_tier, SeverityTier::Medium);
        assert_eq!(result.recommendations, vec!["Standard investigation procedures"]);
        assert_eq!(result.bailable, Some(true));
    }

    #[test]
    fn test_empty_tags() {
        let result = classify_by_rules(&TagSet::new(), &DomainConfig::reference());
        assert_eq!(result.section_count(), 0);
        assert_eq!(result.severity_tier, SeverityTier::Low);
        assert_eq!(result.recommendations, vec!["Basic investigation sufficient"]);
        assert!(result.observations.is_empty());
        assert_eq!(result.source, ClassificationSource::Rules);
    }

    #[test]
    fn test_dwelling_and_night_rules_count_separately() {
        let domain = DomainConfig::reference();
        let location_only = classify_by_rules(
            &tags(&[("location", "house"), ("location", "residence")]),
            &domain,
        );
        assert_eq!(location_only.labels(), vec!["Section 380 - Theft in dwelling house"]);

        let both = classify_by_rules(
            &tags(&[
                ("location", "house"),
                ("location", "residence"),
                ("time", "night_time"),
                ("time", "sunset_to_sunrise"),
            ]),
            &domain,
        );
        assert_eq!(both.section_count(), 2);
        assert_ne!(
            both.applicable_sections[0].justification,
            both.applicable_sections[1].justification
        );
        assert_eq!(both.severity_tier, SeverityTier::Medium);
    }

    #[test]
    fn test_night_burglary_reaches_high() {
        let result = classify_by_rules(
            &tags(&[
                ("intent", "dishonest_intent_to_take"),
                ("method", "unauthorized_entry"),
                ("location", "house"),
                ("time", "night_time"),
            ]),
            &DomainConfig::reference(),
        );
        assert_eq!(result.section_count(), 4);
        assert_eq!(result.severity_tier, SeverityTier::High);
        assert_eq!(
            result.recommendations,
            vec!["Consider non-bailable offense", "Immediate investigation required"]
        );
    }

    #[test]
    fn test_observation_rules_add_no_section() {
        let result = classify_by_rules(
            &tags(&[
                ("victim_context", "house_owner"),
                ("event_condition", "property_taken"),
            ]),
            &DomainConfig::reference(),
        );
        assert_eq!(result.section_count(), 0);
        assert_eq!(result.observations.len(), 2);
        assert!(result.observations[0].contains("lawful owner"));
    }

    #[test]
    fn test_full_burglary_is_high() {
        let result = classify_by_rules(
            &tags(&[
                ("intent", "dishonest_intent_to_take"),
                ("method", "unauthorized_entry"),
                ("method", "without_consent"),
                ("location", "house"),
                ("offender_attribute", "repeat_offender"),
            ]),
            &DomainConfig::reference(),
        );
        assert_eq!(result.section_count(), 5);
        assert_eq!(result.severity_tier, SeverityTier::High);
        assert_eq!(result.bailable, Some(false));
        assert_eq!(
            result.recommendations,
            vec!["Consider non-bailable offense", "Immediate investigation required"]
        );
    }
}
