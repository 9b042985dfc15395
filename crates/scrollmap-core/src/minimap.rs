#![forbid(unsafe_code)]

//! Facade tying the store, the engine and the input handling together.
//!
//! Every store operation is forwarded to the engine as its own event, so a
//! search update that removes three hits and adds two runs two passes, each
//! carrying only its own annotations.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::annotation::{Annotation, AnnotationKind, ItemId};
use crate::config::MinimapConfig;
use crate::error::SyncError;
use crate::host::{GeometryProvider, Host, ListChange, ListCommands, OverlayClick};
use crate::interaction::{ClickOutcome, SelectionChange, handle_click};
use crate::store::{AnnotationBatch, AnnotationStore, StoreEvent, Subscription};
use crate::sync::{PassReport, SyncEngine};

/// Reports from an operation that may run up to two passes.
pub type PassReports = SmallVec<[PassReport; 2]>;

/// Scroll-track minimap for one list.
#[derive(Debug)]
pub struct Minimap {
    store: AnnotationStore,
    engine: SyncEngine,
}

impl Minimap {
    #[must_use]
    pub fn new(config: MinimapConfig) -> Self {
        Self {
            store: AnnotationStore::new(),
            engine: SyncEngine::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MinimapConfig {
        self.engine.config()
    }

    #[must_use]
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Observe store events.
    pub fn subscribe(&mut self, callback: impl Fn(&StoreEvent) + 'static) -> Subscription {
        self.store.subscribe(callback)
    }

    /// Mark items. Annotations whose item is not in the list are dropped.
    pub fn add(&mut self, annotations: &[Annotation], host: &mut Host<'_>) -> Option<PassReport> {
        let list = host.list;
        let present: AnnotationBatch = annotations
            .iter()
            .copied()
            .filter(|a| list.contains(a.item))
            .collect();
        let event = self.store.add(&present)?;
        Some(self.forward(&event, host))
    }

    pub fn remove(&mut self, annotations: &[Annotation], host: &mut Host<'_>) -> Option<PassReport> {
        let event = self.store.remove(annotations)?;
        Some(self.forward(&event, host))
    }

    /// Swap `old` for `new`.
    ///
    /// When `new`'s item is not in the list, `new` is never stored and this
    /// behaves like [`Minimap::remove`] of `old`.
    pub fn replace(
        &mut self,
        old: Annotation,
        new: Annotation,
        host: &mut Host<'_>,
    ) -> Option<PassReport> {
        if !host.list.contains(new.item) {
            return self.remove(&[old], host);
        }
        let event = self.store.replace(old, new)?;
        Some(self.forward(&event, host))
    }

    /// Reposition the given annotations (and, with them, everything else).
    pub fn move_items(&mut self, annotations: &[Annotation], host: &mut Host<'_>) -> Option<PassReport> {
        let event = self.store.move_items(annotations)?;
        Some(self.forward(&event, host))
    }

    /// Drop every annotation and primitive.
    pub fn reset(&mut self, host: &mut Host<'_>) -> PassReport {
        let event = self.store.reset();
        self.forward(&event, host)
    }

    pub fn on_list_changed(&mut self, change: &ListChange, host: &mut Host<'_>) -> PassReport {
        self.engine.on_list_changed(change, &mut self.store, host)
    }

    pub fn on_raw_list_change(
        &mut self,
        action: u32,
        items: &[ItemId],
        host: &mut Host<'_>,
    ) -> Result<PassReport, SyncError> {
        self.engine
            .on_raw_list_change(action, items, &mut self.store, host)
    }

    pub fn on_size_changed(&mut self, host: &mut Host<'_>) -> PassReport {
        self.engine.on_size_changed(&mut self.store, host)
    }

    pub fn run_deferred(&mut self, host: &mut Host<'_>) -> PassReport {
        self.engine.run_deferred(&mut self.store, host)
    }

    pub fn on_surface_attached(&mut self, host: &mut Host<'_>) -> PassReport {
        self.engine.on_surface_attached(&mut self.store, host)
    }

    pub fn reconcile(&mut self, host: &mut Host<'_>) -> PassReport {
        self.engine.reconcile(&mut self.store, host)
    }

    /// Mirror a selection change from the host list as Selection markers.
    pub fn on_selection_changed(
        &mut self,
        change: &SelectionChange,
        host: &mut Host<'_>,
    ) -> PassReports {
        let (removed, added) = change.annotations();
        let mut reports = PassReports::new();
        reports.extend(self.remove(&removed, host));
        reports.extend(self.add(&added, host));
        reports
    }

    /// Replace the Search markers with `matches` (the filter's output set).
    pub fn apply_search(&mut self, matches: &[ItemId], host: &mut Host<'_>) -> PassReports {
        let wanted: FxHashSet<ItemId> = matches.iter().copied().collect();
        let current: FxHashSet<ItemId> = self
            .store
            .of_kind(AnnotationKind::Search)
            .map(|a| a.item)
            .collect();

        let stale: AnnotationBatch = self
            .store
            .of_kind(AnnotationKind::Search)
            .filter(|a| !wanted.contains(&a.item))
            .copied()
            .collect();
        let mut seen = FxHashSet::default();
        let fresh: AnnotationBatch = matches
            .iter()
            .copied()
            .filter(|item| !current.contains(item) && seen.insert(*item))
            .map(Annotation::search)
            .collect();

        let mut reports = PassReports::new();
        reports.extend(self.remove(&stale, host));
        reports.extend(self.add(&fresh, host));
        reports
    }

    /// Route a press on the overlay surface.
    pub fn on_click(
        &self,
        click: &OverlayClick,
        geometry: &dyn GeometryProvider,
        commands: &mut dyn ListCommands,
    ) -> ClickOutcome {
        handle_click(&self.engine, click, geometry, commands)
    }

    fn forward(&mut self, event: &StoreEvent, host: &mut Host<'_>) -> PassReport {
        self.engine.on_store_event(event, &mut self.store, host)
    }
}

impl Default for Minimap {
    fn default() -> Self {
        Self::new(MinimapConfig::default())
    }
}
