//! Deterministic keyword extraction
//!
//! Total over all input: any utterance yields a (possibly empty) tag set.
//! Triggers are lower-cased substrings, so the table is ordered and
//! deliberately conservative.

use once_cell::sync::Lazy;
use regex::Regex;

use fir_assist_core::categories::{
    EVENT_CONDITION, INTENT, LOCATION, METHOD, OFFENDER_ATTRIBUTE, TIME, VICTIM_CONTEXT,
};
use fir_assist_core::TagSet;

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}(?::\d{2})?\s*(?:am|pm|o'clock)\b|\b\d{1,2}:\d{2}\b").expect("clock time regex"));

/// How a rule decides it applies to a lower-cased utterance
#[derive(Clone, Copy)]
pub enum Trigger {
    Keywords(&'static [&'static str]),
    Check(fn(&str) -> bool),
}

impl Trigger {
    fn fires(&self, lower: &str) -> bool {
        match self {
            Trigger::Keywords(words) => words.iter().any(|w| lower.contains(w)),
            Trigger::Check(check) => check(lower),
        }
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Keywords(words) => f.debug_tuple("Keywords").field(words).finish(),
            Trigger::Check(_) => f.write_str("Check(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub trigger: Trigger,
    pub category: &'static str,
    pub tags: &'static [&'static str],
}

const fn rule(
    category: &'static str,
    words: &'static [&'static str],
    tags: &'static [&'static str],
) -> KeywordRule {
    KeywordRule {
        trigger: Trigger::Keywords(words),
        category,
        tags,
    }
}

fn mentions_clock_time(lower: &str) -> bool {
    CLOCK_TIME.is_match(lower)
}

pub static KEYWORD_RULES: &[KeywordRule] = &[
    rule(INTENT, &["steal", "stole", "theft", "thief", "robbery", "robbed", "burglar"], &["dishonest_intent_to_take"]),
    rule(INTENT, &["fraud", "cheat", "scam", "forged"], &["fraudulent_intent"]),
    rule(INTENT, &["attack", "assault", "threaten", "beat me", "hit me"], &["violent_intent"]),
    rule(
        METHOD,
        &["break in", "broke in", "broken into", "breaking into", "entered", "unauthorized", "trespass"],
        &["unauthorized_entry"],
    ),
    rule(
        METHOD,
        &["without permission", "without my permission", "without consent", "no consent"],
        &["without_consent"],
    ),
    rule(METHOD, &["forced", "by force", "smashed", "broke the lock"], &["force"]),
    rule(METHOD, &["tricked", "deceived", "pretended", "lied to"], &["deception"]),
    rule(LOCATION, &["house", "home", "residence", "flat", "apartment"], &["house", "residence"]),
    rule(LOCATION, &["road", "street", "public"], &["public_road"]),
    rule(LOCATION, &["shop", "store", "office", "market"], &["commercial_premises"]),
    rule(LOCATION, &["vehicle", "my car", "motorcycle", "scooter", "bike"], &["vehicle"]),
    rule(TIME, &["night", "dark", "evening"], &["night_time", "sunset_to_sunrise"]),
    rule(TIME, &["morning", "afternoon", "daytime", "during the day"], &["day_time"]),
    KeywordRule {
        trigger: Trigger::Check(mentions_clock_time),
        category: TIME,
        tags: &["specific_time"],
    },
    rule(VICTIM_CONTEXT, &["owner"], &["house_owner"]),
    rule(VICTIM_CONTEXT, &["individual", "person"], &["individual"]),
    rule(VICTIM_CONTEXT, &["my shop", "my business", "my store"], &["business_owner"]),
    rule(VICTIM_CONTEXT, &["employee", "my employer", "at work"], &["employee"]),
    rule(OFFENDER_ATTRIBUTE, &["repeat", "again", "before"], &["repeat_offender"]),
    rule(
        OFFENDER_ATTRIBUTE,
        &["neighbour", "neighbor", "known to me", "i know him", "i know her"],
        &["known_offender"],
    ),
    rule(
        OFFENDER_ATTRIBUTE,
        &["stranger", "unknown person", "unknown man", "unknown woman"],
        &["unknown_offender"],
    ),
    rule(OFFENDER_ATTRIBUTE, &["knife", "gun", "weapon", "armed"], &["armed"]),
    rule(EVENT_CONDITION, &["taken", "stolen", "stole", "missing", "took"], &["property_taken"]),
    rule(EVENT_CONDITION, &["damaged", "destroyed", "vandal"], &["property_damaged"]),
    rule(
        EVENT_CONDITION,
        &["known to be stolen", "know it was stolen", "knew it was stolen", "identified"],
        &["property_known_to_be_stolen"],
    ),
    rule(EVENT_CONDITION, &["injured", "injury", "hurt", "bleeding", "wounded"], &["injury_caused"]),
];

/// Keyword extractor over an ordered rule table
#[derive(Debug, Clone, Copy)]
pub struct KeywordExtractor {
    rules: &'static [KeywordRule],
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            rules: KEYWORD_RULES,
        }
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &'static [KeywordRule] {
        self.rules
    }

    pub fn extract(&self, utterance: &str) -> TagSet {
        let lower = utterance.to_lowercase();
        let mut tags = TagSet::new();
        for rule in self.rules {
            if rule.trigger.fires(&lower) {
                for tag in rule.tags {
                    tags.insert(rule.category, tag);
                }
            }
        }
        tags
    }
}
