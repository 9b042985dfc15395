#![forbid(unsafe_code)]

//! Search-filter producer.
//!
//! Turns filter text into the set of matching items. The engine only sees
//! the resulting set, via [`crate::Minimap::apply_search`].
//!
//! A query is active from [`MIN_QUERY_CHARS`] characters on and matches
//! case-insensitively as a substring of either of an item's two text fields.

use crate::annotation::ItemId;

/// Shortest query that activates the filter, in characters.
pub const MIN_QUERY_CHARS: usize = 3;

/// An item the filter can match against.
pub trait Searchable {
    fn id(&self) -> ItemId;

    /// Primary text (e.g. a title).
    fn title(&self) -> &str;

    /// Secondary text (e.g. a summary).
    fn summary(&self) -> &str;
}

/// Normalized filter text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    needle: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let active = text.chars().count() >= MIN_QUERY_CHARS;
        Self {
            needle: active.then(|| text.to_lowercase()),
        }
    }

    /// Whether the query is long enough to filter anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    #[must_use]
    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        let Some(needle) = &self.needle else {
            return false;
        };
        item.title().to_lowercase().contains(needle.as_str())
            || item.summary().to_lowercase().contains(needle.as_str())
    }

    /// Ids of matching items, in input order. Empty when inactive.
    pub fn matching_ids<'a, T, I>(&self, items: I) -> Vec<ItemId>
    where
        T: Searchable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        if !self.is_active() {
            return Vec::new();
        }
        items
            .into_iter()
            .filter(|item| self.matches(*item))
            .map(|item| item.id())
            .collect()
    }
}
