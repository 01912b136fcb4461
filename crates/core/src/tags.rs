//! Tag sets: category → set of tags
//!
//! Merging is a category-wise set union, so accumulating tags over a
//! conversation never removes anything.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning true if it was not present before.
    /// Blank tags are ignored.
    pub fn insert(&mut self, category: &str, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(tag.to_string())
    }

    pub fn contains(&self, category: &str, tag: &str) -> bool {
        self.categories
            .get(category)
            .map(|set| set.contains(tag))
            .unwrap_or(false)
    }

    pub fn contains_any(&self, category: &str, tags: &[&str]) -> bool {
        tags.iter().any(|tag| self.contains(category, tag))
    }

    /// Tags of a category; absent categories yield nothing
    pub fn tags<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.categories
            .get(category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories
            .get(category)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// All (category, tag) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .flat_map(|(category, set)| set.iter().map(move |tag| (category.as_str(), tag.as_str())))
    }

    /// Union `other` into `self`; returns the number of newly added tags
    pub fn merge(&mut self, other: &TagSet) -> usize {
        let mut added = 0;
        for (category, tag) in other.iter() {
            if self.insert(category, tag) {
                added += 1;
            }
        }
        added
    }

    /// Union of two tag sets
    pub fn merged(&self, other: &TagSet) -> TagSet {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// True if every tag of `other` is also in `self`
    pub fn is_superset(&self, other: &TagSet) -> bool {
        other.iter().all(|(category, tag)| self.contains(category, tag))
    }

    /// Total number of tags across categories
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for (category, tag) in iter {
            set.insert(category, tag);
        }
        set
    }
}
