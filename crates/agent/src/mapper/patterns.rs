//! Utterance pattern rules
//!
//! Each rule pairs a trigger (checked on the lower-cased utterance) with a
//! capture (run on the original text) and the form field it fills. The table
//! order is also the order replies confirm fields in.

use once_cell::sync::Lazy;
use regex::Regex;

use fir_assist_core::FormField;

static NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:name|call|am) (?:is )?([a-zA-Z\s]+)").expect("name regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("digits regex"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{10,})").expect("phone regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})").expect("email regex")
});
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").expect("date regex"));
static CLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}:\d{2})").expect("clock regex"));

static ADDRESS_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)address|live|residing|staying").expect("address words regex"));
static LOCATION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)where|location|place|occurred|happened").expect("location words regex")
});
static DESCRIPTION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)describe|what happened|details|tell me about").expect("description words regex")
});
/// Filler left at the start once trigger words are removed ("my is", "it at", ...)
static LEADING_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:i|i'm|my|the|complainant'?s?|incident|it|this|that|is|was|did|at|in|on|to|a|an|of|me|s)\b[\s,:.-]*)+")
        .expect("filler regex")
});

pub struct PatternRule {
    pub field: FormField,
    pub trigger: fn(&str) -> bool,
    pub capture: fn(&str) -> Option<String>,
    /// Question asked after this field is confirmed
    pub next_question: &'static str,
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule").field("field", &self.field).finish()
    }
}

impl PatternRule {
    /// Captured value if the rule fires on `utterance`
    pub fn apply(&self, utterance: &str) -> Option<String> {
        if (self.trigger)(&utterance.to_lowercase()) {
            (self.capture)(utterance)
        } else {
            None
        }
    }
}

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Remove trigger words and leading filler, keep the remainder if longer than `min_len`
fn remainder(words: &Regex, text: &str, min_len: usize) -> Option<String> {
    let stripped = words.replace_all(text, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = trim_punctuation(&collapsed);
    let value = trim_punctuation(LEADING_FILLER.replace(collapsed, "").as_ref()).to_string();
    (value.chars().count() > min_len).then_some(value)
}

fn trim_punctuation(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | '?' | '!' | ':'))
}

fn mentions_complainant(lower: &str, word: &str) -> bool {
    lower.contains(word) && lower.contains("complainant")
}

fn capture_name(text: &str) -> Option<String> {
    first_group(&NAME, text)
}

fn capture_gender(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    // "female" contains "male"
    if lower.contains("female") {
        Some("Female".to_string())
    } else if lower.contains("male") {
        Some("Male".to_string())
    } else {
        None
    }
}

pub static PATTERN_RULES: &[PatternRule] = &[
    PatternRule {
        field: FormField::ComplainantName,
        trigger: |l| mentions_complainant(l, "name"),
        capture: capture_name,
        next_question: "What's the complainant's age?",
    },
    PatternRule {
        field: FormField::ComplainantAge,
        trigger: |l| mentions_complainant(l, "age"),
        capture: |t| first_group(&DIGITS, t),
        next_question: "What's the complainant's gender?",
    },
    PatternRule {
        field: FormField::ComplainantGender,
        trigger: |l| mentions_complainant(l, "gender"),
        capture: capture_gender,
        next_question: "What's the complainant's address?",
    },
    PatternRule {
        field: FormField::ComplainantAddress,
        trigger: |l| l.contains("address") || l.contains("live"),
        capture: |t| remainder(&ADDRESS_WORDS, t, 5),
        next_question: "What's the complainant's phone number?",
    },
    PatternRule {
        field: FormField::ComplainantPhone,
        trigger: |l| l.contains("phone") || l.contains("number") || l.contains("contact"),
        capture: |t| first_group(&PHONE, t),
        next_question: "When did the incident occur?",
    },
    PatternRule {
        field: FormField::ComplainantEmail,
        trigger: |l| l.contains("email") || l.contains("mail"),
        capture: |t| first_group(&EMAIL, t),
        next_question: "When did the incident occur?",
    },
    PatternRule {
        field: FormField::IncidentDate,
        trigger: |l| {
            (l.contains("incident") || l.contains("happened") || l.contains("occurred"))
                && (l.contains("date") || l.contains("when"))
        },
        capture: |t| first_group(&DATE, t),
        next_question: "What time did it occur?",
    },
    PatternRule {
        field: FormField::IncidentTime,
        trigger: |l| l.contains("time") || l.contains("hour"),
        capture: |t| first_group(&CLOCK, t),
        next_question: "Where did the incident occur?",
    },
    PatternRule {
        field: FormField::IncidentLocation,
        trigger: |l| l.contains("where") || l.contains("location") || l.contains("place"),
        capture: |t| remainder(&LOCATION_WORDS, t, 3),
        next_question: "Can you describe what happened?",
    },
    PatternRule {
        field: FormField::IncidentDescription,
        trigger: |l| l.contains("describe") || l.contains("what happened") || l.contains("details"),
        capture: |t| remainder(&DESCRIPTION_WORDS, t, 10),
        next_question: "What type of incident was this? (e.g., theft, assault, fraud)",
    },
];

/// First rule that fires on `utterance`, with its captured value. The reply
/// confirms this field; the mapper applies every rule.
pub fn first_match(utterance: &str) -> Option<(&'static PatternRule, String)> {
    PATTERN_RULES
        .iter()
        .find_map(|rule| rule.apply(utterance).map(|value| (rule, value)))
}
