//! Form values derived from tags

use fir_assist_core::categories::{INTENT, LOCATION, METHOD, OFFENDER_ATTRIBUTE, TIME};
use fir_assist_core::{categories::EVENT_CONDITION, TagSet, Taxonomy};

/// Incident type per intent tag, first match wins
const INCIDENT_TYPES: &[(&str, &str)] = &[
    ("dishonest_intent_to_take", "Theft"),
    ("fraudulent_intent", "Fraud"),
    ("violent_intent", "Assault"),
];

/// Description clauses in output order
const DESCRIPTION_CLAUSES: &[(&str, &str, &str)] = &[
    (INTENT, "dishonest_intent_to_take", "Theft incident"),
    (METHOD, "unauthorized_entry", "involved unauthorized entry"),
    (LOCATION, "house", "into residential property"),
    (TIME, "night_time", "during night time"),
    (OFFENDER_ATTRIBUTE, "repeat_offender", "by a repeat offender"),
    (EVENT_CONDITION, "property_taken", "resulting in property being taken"),
];

/// Factors counted by [`form_severity`]
const SEVERITY_FACTORS: &[(&str, &str)] = &[
    (INTENT, "dishonest_intent_to_take"),
    (METHOD, "unauthorized_entry"),
    (TIME, "night_time"),
    (OFFENDER_ATTRIBUTE, "repeat_offender"),
    (LOCATION, "house"),
];

pub fn incident_type(tags: &TagSet) -> Option<&'static str> {
    INCIDENT_TYPES
        .iter()
        .find(|(tag, _)| tags.contains(INTENT, tag))
        .map(|(_, label)| *label)
}

pub fn incident_time(tags: &TagSet) -> Option<&'static str> {
    if tags.contains(TIME, "night_time") {
        Some("Night time")
    } else if tags.has_category(TIME) {
        Some("Day time")
    } else {
        None
    }
}

/// Location tags joined in taxonomy order
pub fn incident_location(tags: &TagSet, taxonomy: &Taxonomy) -> Option<String> {
    let ordered = taxonomy.ordered_tags(tags, LOCATION);
    (!ordered.is_empty()).then(|| ordered.join(", "))
}

pub fn incident_description(tags: &TagSet) -> Option<String> {
    let clauses: Vec<&str> = DESCRIPTION_CLAUSES
        .iter()
        .filter(|(category, tag, _)| tags.contains(category, tag))
        .map(|(_, _, clause)| *clause)
        .collect();
    if clauses.is_empty() {
        return None;
    }
    Some(format!("{}.", clauses.join(" ")))
}

/// Form severity label from five weighted factors: 4+ High, 2+ Medium, else Low.
///
/// Independent of the classification tier, which counts applicable sections.
pub fn form_severity(tags: &TagSet) -> &'static str {
    let score = SEVERITY_FACTORS
        .iter()
        .filter(|(category, tag)| tags.contains(category, tag))
        .count();
    match score {
        s if s >= 4 => "High",
        s if s >= 2 => "Medium",
        _ => "Low",
    }
}
