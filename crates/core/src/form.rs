//! First Information Report form state
//!
//! Fields move from empty to filled through auto-population, or are set
//! explicitly by a direct user edit. Edited fields are remembered so that
//! nothing automatic writes over them afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormSection {
    Complainant,
    Incident,
}

impl FormSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormSection::Complainant => "complainant",
            FormSection::Incident => "incident",
        }
    }
}

/// Addressable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    ComplainantName,
    ComplainantAge,
    ComplainantGender,
    ComplainantAddress,
    ComplainantPhone,
    ComplainantEmail,
    IncidentDate,
    IncidentTime,
    IncidentLocation,
    IncidentDescription,
    IncidentType,
    IncidentSeverity,
}

impl FormField {
    pub const ALL: [FormField; 12] = [
        FormField::ComplainantName,
        FormField::ComplainantAge,
        FormField::ComplainantGender,
        FormField::ComplainantAddress,
        FormField::ComplainantPhone,
        FormField::ComplainantEmail,
        FormField::IncidentDate,
        FormField::IncidentTime,
        FormField::IncidentLocation,
        FormField::IncidentDescription,
        FormField::IncidentType,
        FormField::IncidentSeverity,
    ];

    pub fn section(&self) -> FormSection {
        match self {
            FormField::ComplainantName
            | FormField::ComplainantAge
            | FormField::ComplainantGender
            | FormField::ComplainantAddress
            | FormField::ComplainantPhone
            | FormField::ComplainantEmail => FormSection::Complainant,
            _ => FormSection::Incident,
        }
    }

    /// Field key within its section
    pub fn key(&self) -> &'static str {
        match self {
            FormField::ComplainantName => "name",
            FormField::ComplainantAge => "age",
            FormField::ComplainantGender => "gender",
            FormField::ComplainantAddress => "address",
            FormField::ComplainantPhone => "phone",
            FormField::ComplainantEmail => "email",
            FormField::IncidentDate => "date",
            FormField::IncidentTime => "time",
            FormField::IncidentLocation => "location",
            FormField::IncidentDescription => "description",
            FormField::IncidentType => "type",
            FormField::IncidentSeverity => "severity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormField::ComplainantName => "Complainant Name",
            FormField::ComplainantAge => "Complainant Age",
            FormField::ComplainantGender => "Complainant Gender",
            FormField::ComplainantAddress => "Complainant Address",
            FormField::ComplainantPhone => "Complainant Phone",
            FormField::ComplainantEmail => "Complainant Email",
            FormField::IncidentDate => "Incident Date",
            FormField::IncidentTime => "Incident Time",
            FormField::IncidentLocation => "Incident Location",
            FormField::IncidentDescription => "Incident Description",
            FormField::IncidentType => "Incident Type",
            FormField::IncidentSeverity => "Incident Severity",
        }
    }

    /// Fields counted towards form completion
    pub fn is_required(&self) -> bool {
        !matches!(self, FormField::ComplainantEmail | FormField::IncidentSeverity)
    }

    /// Resolve a `(section, field)` pair as addressed by the UI
    pub fn parse(section: &str, field: &str) -> Result<FormField> {
        let section_lc = section.trim().to_lowercase();
        let field_lc = field.trim().to_lowercase();
        FormField::ALL
            .iter()
            .copied()
            .find(|f| f.section().as_str() == section_lc && f.key() == field_lc)
            .ok_or_else(|| Error::UnknownField {
                section: section.to_string(),
                field: field.to_string(),
            })
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section().as_str(), self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complainant {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    pub severity: Option<String>,
}

/// Completion status of one form field or extracted category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStatus {
    pub key: String,
    pub title: String,
    pub value: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub complainant: Complainant,
    pub incident: Incident,
    /// Fields last written by a direct user edit
    #[serde(default)]
    pub user_edited: BTreeSet<FormField>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: FormField) -> &Option<String> {
        match field {
            FormField::ComplainantName => &self.complainant.name,
            FormField::ComplainantAge => &self.complainant.age,
            FormField::ComplainantGender => &self.complainant.gender,
            FormField::ComplainantAddress => &self.complainant.address,
            FormField::ComplainantPhone => &self.complainant.phone,
            FormField::ComplainantEmail => &self.complainant.email,
            FormField::IncidentDate => &self.incident.date,
            FormField::IncidentTime => &self.incident.time,
            FormField::IncidentLocation => &self.incident.location,
            FormField::IncidentDescription => &self.incident.description,
            FormField::IncidentType => &self.incident.incident_type,
            FormField::IncidentSeverity => &self.incident.severity,
        }
    }

    fn slot_mut(&mut self, field: FormField) -> &mut Option<String> {
        match field {
            FormField::ComplainantName => &mut self.complainant.name,
            FormField::ComplainantAge => &mut self.complainant.age,
            FormField::ComplainantGender => &mut self.complainant.gender,
            FormField::ComplainantAddress => &mut self.complainant.address,
            FormField::ComplainantPhone => &mut self.complainant.phone,
            FormField::ComplainantEmail => &mut self.complainant.email,
            FormField::IncidentDate => &mut self.incident.date,
            FormField::IncidentTime => &mut self.incident.time,
            FormField::IncidentLocation => &mut self.incident.location,
            FormField::IncidentDescription => &mut self.incident.description,
            FormField::IncidentType => &mut self.incident.incident_type,
            FormField::IncidentSeverity => &mut self.incident.severity,
        }
    }

    /// Current value, treating blank strings as empty
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self, field: FormField) -> bool {
        self.get(field).is_none()
    }

    pub fn is_user_edited(&self, field: FormField) -> bool {
        self.user_edited.contains(&field)
    }

    /// Whether automatic population may write this field
    pub fn can_fill(&self, field: FormField) -> bool {
        self.is_empty(field) && !self.is_user_edited(field)
    }

    /// Write a value without marking it as user-edited
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Fill a field only if it is empty and not user-edited; returns whether it was written
    pub fn fill_if_empty(&mut self, field: FormField, value: impl Into<String>) -> bool {
        if !self.can_fill(field) {
            return false;
        }
        let value = value.into();
        if value.trim().is_empty() {
            return false;
        }
        self.set(field, value);
        true
    }

    /// Direct user edit. Always wins, and pins the field against automatic writes.
    pub fn edit(&mut self, field: FormField, value: impl Into<String>) {
        self.set(field, value);
        self.user_edited.insert(field);
    }

    /// Fields whose value differs from `previous`
    pub fn changed_fields(&self, previous: &FormState) -> Vec<FormField> {
        FormField::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f) != previous.get(*f))
            .collect()
    }

    /// Share of required fields that are filled, 0–100
    pub fn completion_percentage(&self) -> u8 {
        let required: Vec<FormField> = FormField::ALL
            .iter()
            .copied()
            .filter(FormField::is_required)
            .collect();
        let filled = required.iter().filter(|f| !self.is_empty(**f)).count();
        ((filled * 100) / required.len()) as u8
    }

    pub fn field_statuses(&self) -> Vec<FieldStatus> {
        FormField::ALL
            .iter()
            .map(|field| FieldStatus {
                key: field.to_string(),
                title: field.title().to_string(),
                value: self.get(*field).map(str::to_string),
                completed: !self.is_empty(*field),
            })
            .collect()
    }
}
