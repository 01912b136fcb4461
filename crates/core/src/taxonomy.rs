//! Taxonomy of fact categories and their permitted tags
//!
//! The taxonomy is pure data: it is loaded from the domain configuration and
//! never mutated afterwards. Rule tables refer to categories through the
//! constants in [`categories`].

use serde::{Deserialize, Serialize};

use crate::TagSet;

/// Category names of the reference taxonomy
pub mod categories {
    pub const INTENT: &str = "intent";
    pub const METHOD: &str = "method";
    pub const LOCATION: &str = "location";
    pub const TIME: &str = "time";
    pub const VICTIM_CONTEXT: &str = "victim_context";
    pub const OFFENDER_ATTRIBUTE: &str = "offender_attribute";
    pub const EVENT_CONDITION: &str = "event_condition";
}

/// One category with its ordered permitted tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Human readable title, used in field status listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CategoryDef {
    pub fn new(category: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            category: category.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            title: None,
        }
    }

    /// Title for display, derived from the category name when not configured
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self
                .category
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Ordered set of categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    categories: Vec<CategoryDef>,
}

impl Taxonomy {
    pub fn new(categories: Vec<CategoryDef>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.category.as_str())
    }

    pub fn definitions(&self) -> &[CategoryDef] {
        &self.categories
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c.category == category)
    }

    /// Permitted tags of a category, in taxonomy order. Unknown categories have none.
    pub fn permitted_tags(&self, category: &str) -> &[String] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_valid_tag(&self, category: &str, tag: &str) -> bool {
        self.permitted_tags(category).iter().any(|t| t == tag)
    }

    /// Position of a tag within its category, used for stable ordering
    pub fn tag_position(&self, category: &str, tag: &str) -> Option<usize> {
        self.permitted_tags(category).iter().position(|t| t == tag)
    }

    /// Split a tag set into the tags the taxonomy permits and the ones it does not
    pub fn partition(&self, tags: &TagSet) -> (TagSet, TagSet) {
        let mut known = TagSet::new();
        let mut unknown = TagSet::new();
        for (category, tag) in tags.iter() {
            if self.is_valid_tag(category, tag) {
                known.insert(category, tag);
            } else {
                unknown.insert(category, tag);
            }
        }
        (known, unknown)
    }

    /// Tags of a category present in `tags`, ordered by taxonomy position
    pub fn ordered_tags<'a>(&self, tags: &'a TagSet, category: &str) -> Vec<&'a str> {
        let mut present: Vec<&str> = tags.tags(category).collect();
        present.sort_by_key(|tag| self.tag_position(category, tag).unwrap_or(usize::MAX));
        present
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Taxonomy {
        Taxonomy::new(vec![
            CategoryDef::new(categories::LOCATION, &["house", "residence", "public_road"]),
            CategoryDef::new(categories::TIME, &["night_time", "day_time"]),
        ])
    }

    #[test]
    fn test_permitted_tags() {
        let taxonomy = sample();
        assert_eq!(taxonomy.permitted_tags("location").len(), 3);
        assert!(taxonomy.permitted_tags("weather").is_empty());
        assert!(taxonomy.is_valid_tag("time", "night_time"));
        assert!(!taxonomy.is_valid_tag("time", "house"));
    }

    #[test]
    fn test_partition_quarantines_unknown_tags() {
        let taxonomy = sample();
        let mut tags = TagSet::new();
        tags.insert("location", "house");
        tags.insert("location", "spaceship");
        tags.insert("weather", "rainy");

        let (known, unknown) = taxonomy.partition(&tags);
        assert!(known.contains("location", "house"));
        assert_eq!(known.len(), 1);
        assert!(unknown.contains("location", "spaceship"));
        assert!(unknown.contains("weather", "rainy"));
    }

    #[test]
    fn test_ordered_tags_follow_taxonomy() {
        let taxonomy = sample();
        let mut tags = TagSet::new();
        tags.insert("location", "residence");
        tags.insert("location", "house");
        assert_eq!(taxonomy.ordered_tags(&tags, "location"), vec!["house", "residence"]);
    }

    #[test]
    fn test_display_title() {
        let def = CategoryDef::new("offender_attribute", &[]);
        assert_eq!(def.display_title(), "Offender Attribute");
    }
}
