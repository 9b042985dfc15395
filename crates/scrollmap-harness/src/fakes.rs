#![forbid(unsafe_code)]

//! In-memory stand-ins for every host collaborator.
//!
//! - [`FakeList`]: list model plus a simple stacked layout. Items outside the
//!   materialized set report unknown geometry, like a virtualized panel.
//! - [`RecordingSurface`]: keeps live primitives and an operation log.
//! - [`IdleQueue`]: counts idle requests for the test to drain.
//! - [`RecordingCommands`]: records selection, scroll and paging commands.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use scrollmap_core::{
    GeometryProvider, IdleScheduler, ItemExtent, ItemId, ListAdapter, ListChange,
    ListChangeKind, ListCommands, OverlaySurface, Primitive, PrimitiveHandle,
};

/// List model with stacked item heights.
#[derive(Debug, Clone)]
pub struct FakeList {
    items: Vec<ItemId>,
    heights: HashMap<ItemId, f64>,
    default_height: f64,
    /// `None` means every item is materialized.
    materialized: Option<HashSet<ItemId>>,
    measures: RefCell<HashMap<ItemId, usize>>,
    next_id: u64,
}

impl FakeList {
    /// `n` items with ids `0..n`, each `height` tall, all measurable.
    #[must_use]
    pub fn uniform(n: u64, height: f64) -> Self {
        Self {
            items: (0..n).map(ItemId).collect(),
            heights: HashMap::new(),
            default_height: height,
            materialized: None,
            measures: RefCell::new(HashMap::new()),
            next_id: n,
        }
    }

    /// Only `visible` items report geometry from now on.
    pub fn materialize_only(&mut self, visible: impl IntoIterator<Item = ItemId>) {
        self.materialized = Some(visible.into_iter().collect());
    }

    /// Make `item` measurable.
    pub fn materialize(&mut self, item: ItemId) {
        if let Some(set) = &mut self.materialized {
            set.insert(item);
        }
    }

    /// Make every item measurable.
    pub fn materialize_all(&mut self) {
        self.materialized = None;
    }

    pub fn set_height(&mut self, item: ItemId, height: f64) {
        self.heights.insert(item, height);
    }

    #[must_use]
    pub fn height_of(&self, item: ItemId) -> f64 {
        self.heights.get(&item).copied().unwrap_or(self.default_height)
    }

    /// How many times `measure` was called for `item`.
    #[must_use]
    pub fn measure_count(&self, item: ItemId) -> usize {
        self.measures.borrow().get(&item).copied().unwrap_or(0)
    }

    pub fn reset_measure_counts(&self) {
        self.measures.borrow_mut().clear();
    }

    /// Append a fresh item.
    pub fn push(&mut self) -> (ItemId, ListChange) {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(id);
        (id, ListChange::new(ListChangeKind::Add, vec![id]))
    }

    pub fn insert(&mut self, index: usize, item: ItemId) -> ListChange {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.next_id = self.next_id.max(item.0 + 1);
        ListChange::new(ListChangeKind::Add, vec![item])
    }

    pub fn remove(&mut self, item: ItemId) -> ListChange {
        self.items.retain(|&i| i != item);
        ListChange::new(ListChangeKind::Remove, vec![item])
    }

    pub fn replace(&mut self, old: ItemId, new: ItemId) -> ListChange {
        if let Some(slot) = self.items.iter_mut().find(|i| **i == old) {
            *slot = new;
        }
        self.next_id = self.next_id.max(new.0 + 1);
        ListChange::new(ListChangeKind::Replace, vec![old, new])
    }

    /// Move `item` to `to` (clamped).
    pub fn move_item(&mut self, item: ItemId, to: usize) -> ListChange {
        if let Some(from) = self.items.iter().position(|&i| i == item) {
            let id = self.items.remove(from);
            let to = to.min(self.items.len());
            self.items.insert(to, id);
        }
        ListChange::new(ListChangeKind::Move, vec![item])
    }

    /// Replace the whole list in bulk.
    pub fn reset(&mut self, items: Vec<ItemId>) -> ListChange {
        if let Some(max) = items.iter().map(|i| i.0).max() {
            self.next_id = self.next_id.max(max + 1);
        }
        self.items = items;
        ListChange::new(ListChangeKind::Reset, Vec::new())
    }

    fn is_materialized(&self, item: ItemId) -> bool {
        self.materialized
            .as_ref()
            .is_none_or(|set| set.contains(&item))
    }

    /// Content-space top of `item`, computed from the stacked layout.
    #[must_use]
    pub fn top_of(&self, item: ItemId) -> Option<f64> {
        let index = self.items.iter().position(|&i| i == item)?;
        Some(self.items[..index].iter().map(|&i| self.height_of(i)).sum())
    }
}

impl ListAdapter for FakeList {
    fn items(&self) -> &[ItemId] {
        &self.items
    }
}

impl GeometryProvider for FakeList {
    fn measure(&self, item: ItemId) -> Option<ItemExtent> {
        *self.measures.borrow_mut().entry(item).or_insert(0) += 1;
        if !self.is_materialized(item) {
            return None;
        }
        let top = self.top_of(item)?;
        Some(ItemExtent::new(top, self.height_of(item)))
    }

    fn content_height(&self) -> Option<f64> {
        Some(self.items.iter().map(|&i| self.height_of(i)).sum())
    }
}

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceOp {
    Add(PrimitiveHandle),
    Update(PrimitiveHandle),
    Remove(PrimitiveHandle),
}

/// Overlay surface that records every call.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub attached: bool,
    live: BTreeMap<PrimitiveHandle, Primitive>,
    ops: Vec<SurfaceOp>,
    next: u64,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            attached: true,
            live: BTreeMap::new(),
            ops: Vec::new(),
            next: 0,
        }
    }

    /// Surface that is not yet part of the visual tree.
    #[must_use]
    pub fn detached(width: f64, height: f64) -> Self {
        Self {
            attached: false,
            ..Self::new(width, height)
        }
    }

    #[must_use]
    pub fn live(&self) -> &BTreeMap<PrimitiveHandle, Primitive> {
        &self.live
    }

    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Operations recorded after the first `mark` ones.
    #[must_use]
    pub fn ops_since(&self, mark: usize) -> &[SurfaceOp] {
        &self.ops[mark.min(self.ops.len())..]
    }

    #[must_use]
    pub fn add_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, SurfaceOp::Add(_))).count()
    }
}

impl OverlaySurface for RecordingSurface {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn add_primitive(&mut self, primitive: &Primitive) -> PrimitiveHandle {
        self.next += 1;
        let handle = PrimitiveHandle(self.next);
        self.live.insert(handle, *primitive);
        self.ops.push(SurfaceOp::Add(handle));
        handle
    }

    fn update_primitive(&mut self, handle: PrimitiveHandle, primitive: &Primitive) {
        assert!(
            self.live.contains_key(&handle),
            "update of unknown primitive {handle}"
        );
        self.live.insert(handle, *primitive);
        self.ops.push(SurfaceOp::Update(handle));
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) {
        assert!(
            self.live.remove(&handle).is_some(),
            "removal of unknown primitive {handle}"
        );
        self.ops.push(SurfaceOp::Remove(handle));
    }
}

/// Idle scheduler that only counts.
#[derive(Debug, Clone, Default)]
pub struct IdleQueue {
    /// Requests not yet drained.
    pub pending: usize,
    /// Requests ever made.
    pub total: usize,
}

impl IdleScheduler for IdleQueue {
    fn schedule_idle(&mut self) {
        self.pending += 1;
        self.total += 1;
    }
}

/// Page direction recorded by [`RecordingCommands`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Up,
    Down,
}

/// Host commands, recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingCommands {
    pub viewport_height: f64,
    pub thumb_offset: f64,
    pub selected: Option<ItemId>,
    pub scrolled_to: Vec<f64>,
    pub brought_into_view: Vec<ItemId>,
    pub pages: Vec<Page>,
}

impl RecordingCommands {
    #[must_use]
    pub fn new(viewport_height: f64, thumb_offset: f64) -> Self {
        Self {
            viewport_height,
            thumb_offset,
            ..Self::default()
        }
    }
}

impl ListCommands for RecordingCommands {
    fn select(&mut self, item: ItemId) {
        self.selected = Some(item);
    }

    fn scroll_to_offset(&mut self, offset: f64) {
        self.scrolled_to.push(offset);
    }

    fn scroll_into_view(&mut self, item: ItemId) {
        self.brought_into_view.push(item);
    }

    fn page_up(&mut self) {
        self.pages.push(Page::Up);
    }

    fn page_down(&mut self) {
        self.pages.push(Page::Down);
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn thumb_offset(&self) -> f64 {
        self.thumb_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacked_layout() {
        let mut list = FakeList::uniform(4, 10.0);
        list.set_height(ItemId(1), 30.0);
        assert_eq!(list.measure(ItemId(2)), Some(ItemExtent::new(40.0, 10.0)));
        assert_eq!(list.content_height(), Some(60.0));
        assert_eq!(list.measure_count(ItemId(2)), 1);
    }

    #[test]
    fn virtualized_items_are_unknown() {
        let mut list = FakeList::uniform(4, 10.0);
        list.materialize_only([ItemId(0)]);
        assert!(list.measure(ItemId(3)).is_none());
        list.materialize(ItemId(3));
        assert!(list.measure(ItemId(3)).is_some());
    }

    #[test]
    fn list_mutations_report_changes() {
        let mut list = FakeList::uniform(3, 10.0);
        let (id, change) = list.push();
        assert_eq!(id, ItemId(3));
        assert_eq!(change.kind, ListChangeKind::Add);
        list.move_item(ItemId(3), 0);
        assert_eq!(list.index_of(ItemId(3)), Some(0));
        let change = list.remove(ItemId(0));
        assert_eq!(change.kind, ListChangeKind::Remove);
        assert!(!list.contains(ItemId(0)));
    }

    #[test]
    fn surface_records_ops() {
        let mut surface = RecordingSurface::new(10.0, 100.0);
        let p = Primitive {
            shape: scrollmap_core::Shape::Line { y: 1.0 },
            color: scrollmap_core::Rgb::new(0, 0, 0),
            thickness: 2.0,
            clickable: false,
        };
        let h = surface.add_primitive(&p);
        surface.update_primitive(h, &p);
        surface.remove_primitive(h);
        assert_eq!(
            surface.ops(),
            &[SurfaceOp::Add(h), SurfaceOp::Update(h), SurfaceOp::Remove(h)]
        );
        assert!(surface.live().is_empty());
    }
}
