//! Prompt construction for extraction and classification

use std::fmt::Write;

use fir_assist_config::DomainConfig;
use fir_assist_core::{ConversationTurn, Speaker, TagSet, Taxonomy};

/// Prompt asking for a JSON object keyed by taxonomy category
pub fn build_extraction_prompt(
    utterance: &str,
    history: &[ConversationTurn],
    taxonomy: &Taxonomy,
) -> String {
    let mut prompt = String::from(
        "Analyze the following FIR (First Information Report) conversation and extract \
         structured legal information.\n\n",
    );

    if !history.is_empty() {
        prompt.push_str("Conversation context:\n");
        for turn in history {
            let speaker = match turn.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            let _ = writeln!(prompt, "{}: {}", speaker, turn.text);
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "Current message: \"{}\"\n", utterance);

    prompt.push_str("Extract tags for each category, using only these values:\n");
    for category in taxonomy.definitions() {
        let _ = writeln!(prompt, "- {}: {}", category.category, category.tags.join(", "));
    }

    let example: Vec<String> = taxonomy
        .categories()
        .map(|c| format!("\"{}\": []", c))
        .collect();
    let _ = write!(
        prompt,
        "\nRespond with a single JSON object whose keys are exactly the categories above and \
         whose values are arrays of tags, for example:\n{{{}}}\n\
         Only include tags clearly supported by the conversation.",
        example.join(", ")
    );

    prompt
}

/// Prompt asking for applicable sections, grounded on the rule table
pub fn build_classification_prompt(tags: &TagSet, domain: &DomainConfig) -> String {
    let tags_json = serde_json::to_string_pretty(tags).unwrap_or_else(|_| "{}".to_string());
    let code = if domain.legal_code.is_empty() {
        "applicable criminal law"
    } else {
        domain.legal_code.as_str()
    };

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a legal expert analyzing a First Information Report under the {}.\n",
        code
    );
    let _ = writeln!(prompt, "Extracted facts:\n{}\n", tags_json);

    if !domain.legal_rules.is_empty() {
        prompt.push_str("Reference rules:\n");
        for rule in &domain.legal_rules {
            let when: Vec<String> = rule.when_any.iter().cloned().map(String::from).collect();
            let outcome = rule.section.as_deref().unwrap_or("(supporting observation)");
            let _ = writeln!(
                prompt,
                "- {} -> {}: {}",
                when.join(" or "),
                outcome,
                rule.justification
            );
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Respond with a single JSON object containing:\n\
         - \"applicable_sections\": array of section labels\n\
         - \"reasoning\": array of justifications, one per section, in the same order\n\
         - \"severity\": \"low\", \"medium\" or \"high\"\n\
         - \"recommendations\": array of recommended actions\n\
         - \"punishment_range\": string\n\
         - \"bailable\": boolean",
    );

    prompt
}
