#![forbid(unsafe_code)]

//! Annotation model: which items want a marker, and of what kind.
//!
//! An [`Annotation`] is keyed by `(item, kind)`. The same item may carry a
//! [`AnnotationKind::Selection`] and a [`AnnotationKind::Search`] annotation
//! at the same time; they are distinct entries with distinct primitives.

use std::fmt;

/// Stable identity of a list item.
///
/// Hosts map their items to ids once (pointer, database key, feed id + feed
/// name, ...). Two items with equal contents but different ids are different
/// items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new item id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn as_key(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }
}

/// Why an item is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    /// The item is part of the host list's current selection.
    Selection,
    /// The item matches the live search filter.
    Search,
}

impl AnnotationKind {
    /// Marker color for this kind. Fixed per kind.
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Selection => Rgb::new(70, 130, 180),
            Self::Search => Rgb::new(255, 165, 0),
        }
    }

    /// Whether primitives of this kind accept pointer presses.
    ///
    /// Selection markers are navigated through the list itself, so only
    /// search hits get a click target.
    #[must_use]
    pub const fn is_clickable(self) -> bool {
        matches!(self, Self::Search)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to mark `item` with a marker of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub item: ItemId,
    pub kind: AnnotationKind,
}

impl Annotation {
    #[must_use]
    pub const fn new(item: ItemId, kind: AnnotationKind) -> Self {
        Self { item, kind }
    }

    /// Selection-kind annotation for `item`.
    #[must_use]
    pub const fn selection(item: ItemId) -> Self {
        Self::new(item, AnnotationKind::Selection)
    }

    /// Search-kind annotation for `item`.
    #[must_use]
    pub const fn search(item: ItemId) -> Self {
        Self::new(item, AnnotationKind::Search)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.item)
    }
}
