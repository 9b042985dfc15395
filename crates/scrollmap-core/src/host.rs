#![forbid(unsafe_code)]

//! Contracts for the collaborators the engine does not own.
//!
//! The engine never walks a rendering tree. A concrete toolkit binds these
//! traits to its own list model, container measurement, drawing surface and
//! event loop. All of them are borrowed per call through [`Host`], so every
//! pass (including a deferred one) reads current state.

use std::fmt;

use crate::annotation::{ItemId, Rgb};
use crate::error::SyncError;

/// Ordered sequence of list items.
pub trait ListAdapter {
    /// Items in display order.
    fn items(&self) -> &[ItemId];

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Display index of `item`, if it is in the list.
    fn index_of(&self, item: ItemId) -> Option<usize> {
        self.items().iter().position(|&i| i == item)
    }

    fn contains(&self, item: ItemId) -> bool {
        self.index_of(item).is_some()
    }
}

/// Kind of list mutation delivered by the list adapter.
///
/// The set is closed. Hosts that deliver raw action codes convert them with
/// `ListChangeKind::try_from(code)`; any other code is a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListChangeKind {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

impl ListChangeKind {
    /// Raw action code, matching the order of the variants.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Add => 0,
            Self::Remove => 1,
            Self::Replace => 2,
            Self::Move => 3,
            Self::Reset => 4,
        }
    }
}

impl TryFrom<u32> for ListChangeKind {
    type Error = SyncError;

    fn try_from(action: u32) -> Result<Self, Self::Error> {
        match action {
            0 => Ok(Self::Add),
            1 => Ok(Self::Remove),
            2 => Ok(Self::Replace),
            3 => Ok(Self::Move),
            4 => Ok(Self::Reset),
            _ => Err(SyncError::UnrecognizedListChange { action }),
        }
    }
}

/// A list mutation and the items it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChange {
    pub kind: ListChangeKind,
    pub items: Vec<ItemId>,
}

impl ListChange {
    #[must_use]
    pub fn new(kind: ListChangeKind, items: impl Into<Vec<ItemId>>) -> Self {
        Self {
            kind,
            items: items.into(),
        }
    }

    /// Build from a raw action code.
    pub fn from_raw(action: u32, items: impl Into<Vec<ItemId>>) -> Result<Self, SyncError> {
        Ok(Self::new(ListChangeKind::try_from(action)?, items))
    }
}

/// Vertical extent of a materialized item, in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemExtent {
    pub top: f64,
    pub height: f64,
}

impl ItemExtent {
    #[must_use]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Per-item measurement, available only for materialized containers.
pub trait GeometryProvider {
    /// Current extent of `item`, or `None` while it is not measurable.
    fn measure(&self, item: ItemId) -> Option<ItemExtent>;

    /// Overall scrollable content height, when the host knows it.
    fn content_height(&self) -> Option<f64> {
        None
    }
}

/// Opaque handle to a primitive living on an [`OverlaySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveHandle(pub u64);

impl fmt::Display for PrimitiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prim{}", self.0)
    }
}

/// Marker geometry in overlay coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Horizontal line across the full surface width.
    Line { y: f64 },
    /// Filled band.
    Region { top: f64, height: f64 },
}

impl Shape {
    /// Vertical anchor of the shape: `y` for a line, `top` for a region.
    #[must_use]
    pub fn anchor(&self) -> f64 {
        match *self {
            Self::Line { y } => y,
            Self::Region { top, .. } => top,
        }
    }
}

/// A shape plus the styling the surface needs to draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub color: Rgb,
    /// Stroke thickness for lines; ignored for regions.
    pub thickness: f64,
    /// Whether the surface should route pointer presses on this primitive.
    pub clickable: bool,
}

/// Drawing surface hosting the markers (typically the scroll track).
pub trait OverlaySurface {
    /// False until the surface is attached to the host's visual tree.
    fn is_attached(&self) -> bool {
        true
    }

    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn add_primitive(&mut self, primitive: &Primitive) -> PrimitiveHandle;

    fn update_primitive(&mut self, handle: PrimitiveHandle, primitive: &Primitive);

    fn remove_primitive(&mut self, handle: PrimitiveHandle);
}

/// Host event loop hook for the deferred re-run.
pub trait IdleScheduler {
    /// Ask the loop to call `run_deferred` once pending layout and render
    /// work has completed (lowest priority available).
    fn schedule_idle(&mut self);
}

/// Commands issued back to the host list and its scroller.
pub trait ListCommands {
    fn select(&mut self, item: ItemId);

    /// Scroll so that content offset `offset` is at the top of the viewport.
    fn scroll_to_offset(&mut self, offset: f64);

    /// Bring `item` into view by whatever means the host has.
    fn scroll_into_view(&mut self, item: ItemId);

    fn page_up(&mut self);

    fn page_down(&mut self);

    fn viewport_height(&self) -> f64;

    /// Top of the scrollbar thumb, in overlay coordinates.
    fn thumb_offset(&self) -> f64;
}

/// A pointer press on the overlay surface, in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayClick {
    pub y: f64,
    /// The clickable primitive under the pointer, if any.
    pub target: Option<PrimitiveHandle>,
}

impl OverlayClick {
    /// Press on the empty track.
    #[must_use]
    pub const fn background(y: f64) -> Self {
        Self { y, target: None }
    }

    /// Press on a marker.
    #[must_use]
    pub const fn on(handle: PrimitiveHandle, y: f64) -> Self {
        Self {
            y,
            target: Some(handle),
        }
    }
}

/// Collaborators borrowed for the duration of one engine call.
pub struct Host<'a> {
    pub list: &'a dyn ListAdapter,
    pub geometry: &'a dyn GeometryProvider,
    pub surface: &'a mut dyn OverlaySurface,
    pub scheduler: &'a mut dyn IdleScheduler,
}

impl<'a> Host<'a> {
    #[must_use]
    pub fn new(
        list: &'a dyn ListAdapter,
        geometry: &'a dyn GeometryProvider,
        surface: &'a mut dyn OverlaySurface,
        scheduler: &'a mut dyn IdleScheduler,
    ) -> Self {
        Self {
            list,
            geometry,
            surface,
            scheduler,
        }
    }
}

impl fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("items", &self.list.len())
            .field("surface_attached", &self.surface.is_attached())
            .field("surface_height", &self.surface.height())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ids(Vec<ItemId>);

    impl ListAdapter for Ids {
        fn items(&self) -> &[ItemId] {
            &self.0
        }
    }

    #[test]
    fn list_adapter_defaults() {
        let list = Ids(vec![ItemId(4), ItemId(8), ItemId(15)]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.index_of(ItemId(8)), Some(1));
        assert!(list.contains(ItemId(15)));
        assert!(!list.contains(ItemId(16)));
    }

    #[test]
    fn raw_change_codes_round_trip() {
        for kind in [
            ListChangeKind::Add,
            ListChangeKind::Remove,
            ListChangeKind::Replace,
            ListChangeKind::Move,
            ListChangeKind::Reset,
        ] {
            assert_eq!(ListChangeKind::try_from(kind.code()), Ok(kind));
        }
    }

    #[test]
    fn unknown_change_code_is_error() {
        let err = ListChange::from_raw(42, vec![ItemId(1)]).unwrap_err();
        assert_eq!(err, SyncError::UnrecognizedListChange { action: 42 });
    }

    #[test]
    fn extent_center() {
        let e = ItemExtent::new(100.0, 20.0);
        assert_eq!(e.center(), 110.0);
        assert_eq!(e.bottom(), 120.0);
    }
}
