//! Assistant reply synthesis

use fir_assist_core::{FormField, FormState};

use crate::mapper::first_match;

/// Reply for a turn that failed
pub const APOLOGY: &str = "I apologize, but I encountered an error processing your request. \
     Please try again or check your GenAI configuration.";

pub const GENERIC_GUIDANCE: &str = "I understand. Please provide more specific details so I can \
     help you fill out the form correctly and extract relevant information. You can tell me about \
     the complainant's information, incident details, or ask me to help with any specific field.";

#[derive(Debug, Clone, Default)]
pub struct ReplyGenerator;

impl ReplyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Reply to `utterance` given the form before and after reconciliation and
    /// the number of tags extracted this turn
    pub fn reply(
        &self,
        utterance: &str,
        before: &FormState,
        after: &FormState,
        extracted: usize,
    ) -> String {
        if let Some((rule, _)) = first_match(utterance) {
            let field = rule.field;
            match after.get(field) {
                Some(value) if before.get(field) != Some(value) => {
                    return format!("{} {}", confirmation(field, value), rule.next_question);
                },
                Some(existing) => {
                    return format!(
                        "{} is already recorded as \"{}\". {}",
                        field.title(),
                        existing,
                        rule.next_question
                    );
                },
                // Pinned blank by a user edit
                None => {},
            }
        }

        if extracted > 0 {
            format!(
                "I've extracted {} data points from your description and auto-populated the form. \
                 Please provide more specific details so I can help you complete the remaining \
                 fields.",
                extracted
            )
        } else {
            GENERIC_GUIDANCE.to_string()
        }
    }
}

fn confirmation(field: FormField, value: &str) -> String {
    match field {
        FormField::ComplainantName => format!("I've updated the complainant name to \"{}\".", value),
        FormField::ComplainantAge => format!("I've updated the complainant age to {}.", value),
        FormField::ComplainantGender => format!("I've updated the complainant gender to {}.", value),
        other => format!("I've updated the {}.", other.title().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_with_next_question() {
        let before = FormState::new();
        let mut after = before.clone();
        after.set(FormField::ComplainantName, "Ravi Kumar");

        let reply = ReplyGenerator::new().reply("The complainant name is Ravi Kumar", &before, &after, 0);
        assert_eq!(
            reply,
            "I've updated the complainant name to \"Ravi Kumar\". What's the complainant's age?"
        );
    }

    #[test]
    fn test_generic_field_confirmation() {
        let before = FormState::new();
        let mut after = before.clone();
        after.set(FormField::ComplainantPhone, "9876543210");

        let reply = ReplyGenerator::new().reply("My phone number is 9876543210", &before, &after, 0);
        assert_eq!(
            reply,
            "I've updated the complainant phone. When did the incident occur?"
        );
    }

    #[test]
    fn test_already_recorded() {
        let mut form = FormState::new();
        form.set(FormField::ComplainantAge, "40");

        let reply = ReplyGenerator::new().reply("The complainant age is 42", &form, &form, 0);
        assert_eq!(
            reply,
            "Complainant Age is already recorded as \"40\". What's the complainant's gender?"
        );
    }

    #[test]
    fn test_data_points_and_guidance() {
        let form = FormState::new();
        let generator = ReplyGenerator::new();

        let reply = generator.reply("they took my laptop", &form, &form, 3);
        assert!(reply.starts_with("I've extracted 3 data points from your description"));

        assert_eq!(generator.reply("hello", &form, &form, 0), GENERIC_GUIDANCE);
    }
}
