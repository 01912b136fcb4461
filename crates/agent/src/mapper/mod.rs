//! Form auto-population
//!
//! `reconcile` never clears or overwrites a filled field, and never touches a
//! field the user edited directly. Severity is the one derived field that is
//! recomputed on every update.

mod derive;
mod patterns;

pub use derive::{form_severity, incident_description, incident_location, incident_time, incident_type};
pub use patterns::{first_match, PatternRule, PATTERN_RULES};

use std::sync::Arc;

use fir_assist_core::{FormField, FormState, TagSet, Taxonomy};

pub struct FieldMapper {
    taxonomy: Arc<Taxonomy>,
}

impl FieldMapper {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// Reconcile `form` with the accumulated `tags` and the latest utterance.
    /// Returns the updated copy; `form` itself is untouched.
    pub fn reconcile(&self, form: &FormState, tags: &TagSet, utterance: &str) -> FormState {
        let mut next = form.clone();

        // Utterance patterns take precedence over tag defaults. Every rule is
        // tried; each fills only its own field.
        for rule in PATTERN_RULES {
            if let Some(value) = rule.apply(utterance) {
                if next.fill_if_empty(rule.field, value) {
                    tracing::debug!(field = %rule.field, "Filled field from utterance pattern");
                }
            }
        }

        if let Some(kind) = incident_type(tags) {
            next.fill_if_empty(FormField::IncidentType, kind);
        }
        if let Some(time) = incident_time(tags) {
            next.fill_if_empty(FormField::IncidentTime, time);
        }
        if let Some(location) = incident_location(tags, &self.taxonomy) {
            next.fill_if_empty(FormField::IncidentLocation, location);
        }
        if let Some(description) = incident_description(tags) {
            next.fill_if_empty(FormField::IncidentDescription, description);
        }

        if !next.is_user_edited(FormField::IncidentSeverity) {
            next.set(FormField::IncidentSeverity, form_severity(tags));
        }

        next
    }
}
