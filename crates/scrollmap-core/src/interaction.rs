#![forbid(unsafe_code)]

//! Pointer input on the overlay, and the selection feed.
//!
//! A press on a clickable marker selects its item and centers it in the
//! viewport. A press anywhere else on the track pages the list toward the
//! press, like a plain scrollbar track.

use smallvec::SmallVec;
use tracing::debug;

use crate::annotation::{Annotation, ItemId};
use crate::host::{GeometryProvider, ItemExtent, ListCommands, OverlayClick};
use crate::store::AnnotationBatch;
use crate::sync::SyncEngine;

/// Result of processing a press on the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// A marker was hit; its item was selected and scrolled to.
    Navigated {
        item: ItemId,
        /// Content offset requested, or `None` when the item was not
        /// measurable and the host was asked to bring it into view instead.
        offset: Option<f64>,
    },
    PageUp,
    PageDown,
}

/// Content offset that centers `target` in a viewport of `viewport_height`.
#[must_use]
pub fn center_offset(target: ItemExtent, viewport_height: f64) -> f64 {
    target.top - viewport_height / 2.0 + target.height / 2.0
}

/// Route a press on the overlay.
///
/// Presses on unknown or non-clickable primitives behave like presses on
/// the background.
pub fn handle_click(
    engine: &SyncEngine,
    click: &OverlayClick,
    geometry: &dyn GeometryProvider,
    commands: &mut dyn ListCommands,
) -> ClickOutcome {
    let hit = click
        .target
        .and_then(|handle| engine.annotation_for(handle))
        .filter(|a| a.kind.is_clickable());

    if let Some(annotation) = hit {
        let item = annotation.item;
        commands.select(item);
        let offset = geometry
            .measure(item)
            .map(|extent| center_offset(extent, commands.viewport_height()));
        match offset {
            Some(offset) => commands.scroll_to_offset(offset),
            None => commands.scroll_into_view(item),
        }
        debug!(item = %item, ?offset, "marker click");
        return ClickOutcome::Navigated { item, offset };
    }

    if click.y < commands.thumb_offset() {
        commands.page_up();
        ClickOutcome::PageUp
    } else {
        commands.page_down();
        ClickOutcome::PageDown
    }
}

/// Items entering and leaving the host list's selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub added: SmallVec<[ItemId; 2]>,
    pub removed: SmallVec<[ItemId; 2]>,
}

impl SelectionChange {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, item: ItemId) -> Self {
        self.added.push(item);
        self
    }

    #[must_use]
    pub fn deselect(mut self, item: ItemId) -> Self {
        self.removed.push(item);
        self
    }

    /// Single-select transition from `previous` to `next`.
    #[must_use]
    pub fn replace(previous: Option<ItemId>, next: ItemId) -> Self {
        let change = Self::new().select(next);
        match previous {
            Some(prev) if prev != next => change.deselect(prev),
            _ => change,
        }
    }

    /// Selection annotations to remove and to add, in that order.
    #[must_use]
    pub fn annotations(&self) -> (AnnotationBatch, AnnotationBatch) {
        let removed = self
            .removed
            .iter()
            .filter(|item| !self.added.contains(*item))
            .map(|&item| Annotation::selection(item))
            .collect();
        let added = self
            .added
            .iter()
            .map(|&item| Annotation::selection(item))
            .collect();
        (removed, added)
    }
}
