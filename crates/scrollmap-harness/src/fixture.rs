#![forbid(unsafe_code)]

//! One minimap wired to a full set of fakes.

use std::collections::HashSet;

use scrollmap_core::{
    Annotation, ClickOutcome, Host, ItemId, ListAdapter, ListChange, Minimap, MinimapConfig,
    OverlayClick, PassReport, PassReports, Primitive, PrimitiveHandle, SelectionChange,
};

use crate::fakes::{FakeList, IdleQueue, RecordingCommands, RecordingSurface};

/// Upper bound on idle re-runs drained by [`Fixture::drain_idle`].
const DRAIN_LIMIT: usize = 64;

/// A minimap plus its host, driven step by step from tests.
#[derive(Debug)]
pub struct Fixture {
    pub minimap: Minimap,
    pub list: FakeList,
    pub surface: RecordingSurface,
    pub idle: IdleQueue,
    pub commands: RecordingCommands,
}

impl Fixture {
    #[must_use]
    pub fn new(config: MinimapConfig, list: FakeList, surface: RecordingSurface) -> Self {
        Self {
            minimap: Minimap::new(config),
            list,
            surface,
            idle: IdleQueue::default(),
            commands: RecordingCommands::new(100.0, 0.0),
        }
    }

    /// `n` uniform items of `item_height` on a 12 x `surface_height` track.
    #[must_use]
    pub fn uniform(config: MinimapConfig, n: u64, item_height: f64, surface_height: f64) -> Self {
        Self::new(
            config,
            FakeList::uniform(n, item_height),
            RecordingSurface::new(12.0, surface_height),
        )
    }

    /// Run `f` with the minimap and a freshly borrowed host.
    pub fn with_host<R>(&mut self, f: impl FnOnce(&mut Minimap, &mut Host<'_>) -> R) -> R {
        let mut host = Host::new(&self.list, &self.list, &mut self.surface, &mut self.idle);
        f(&mut self.minimap, &mut host)
    }

    pub fn add(&mut self, annotations: &[Annotation]) -> Option<PassReport> {
        self.with_host(|m, host| m.add(annotations, host))
    }

    pub fn remove(&mut self, annotations: &[Annotation]) -> Option<PassReport> {
        self.with_host(|m, host| m.remove(annotations, host))
    }

    /// Feed a list change produced by one of the [`FakeList`] mutators.
    pub fn list_changed(&mut self, change: &ListChange) -> PassReport {
        self.with_host(|m, host| m.on_list_changed(change, host))
    }

    pub fn size_changed(&mut self) -> PassReport {
        self.with_host(|m, host| m.on_size_changed(host))
    }

    pub fn reconcile(&mut self) -> PassReport {
        self.with_host(|m, host| m.reconcile(host))
    }

    pub fn select(&mut self, change: &SelectionChange) -> PassReports {
        self.with_host(|m, host| m.on_selection_changed(change, host))
    }

    pub fn search(&mut self, matches: &[ItemId]) -> PassReports {
        self.with_host(|m, host| m.apply_search(matches, host))
    }

    pub fn attach(&mut self) -> PassReport {
        self.surface.attached = true;
        self.with_host(|m, host| m.on_surface_attached(host))
    }

    /// Run one idle re-run, as the host loop would.
    pub fn run_idle(&mut self) -> Option<PassReport> {
        if self.idle.pending == 0 {
            return None;
        }
        self.idle.pending -= 1;
        Some(self.with_host(|m, host| m.run_deferred(host)))
    }

    /// Run idle re-runs until none is pending. Returns how many ran.
    pub fn drain_idle(&mut self) -> usize {
        let mut ran = 0;
        while ran < DRAIN_LIMIT && self.run_idle().is_some() {
            ran += 1;
        }
        if self.idle.pending > 0 {
            tracing::warn!(pending = self.idle.pending, "idle queue not drained");
        }
        tracing::debug!(ran, "idle queue drained");
        ran
    }

    pub fn click(&mut self, click: OverlayClick) -> ClickOutcome {
        self.minimap.on_click(&click, &self.list, &mut self.commands)
    }

    /// Handle of the live primitive for `annotation`.
    #[must_use]
    pub fn handle_of(&self, annotation: &Annotation) -> Option<PrimitiveHandle> {
        self.surface
            .live()
            .keys()
            .copied()
            .find(|&h| self.minimap.engine().annotation_for(h) == Some(*annotation))
    }

    /// Live primitive drawn for `annotation`.
    #[must_use]
    pub fn primitive(&self, annotation: &Annotation) -> Option<Primitive> {
        let handle = self.handle_of(annotation)?;
        self.surface.live().get(&handle).copied()
    }

    /// Check that live primitives are exactly one per stored annotation
    /// whose item is in the list.
    pub fn check_bijection(&self) -> Result<(), String> {
        let expected: HashSet<Annotation> = self
            .minimap
            .store()
            .iter()
            .filter(|a| self.list.contains(a.item))
            .copied()
            .collect();
        let mut seen = HashSet::new();
        for handle in self.surface.live().keys() {
            let Some(owner) = self.minimap.engine().annotation_for(*handle) else {
                return Err(format!("orphan primitive {handle}"));
            };
            if !expected.contains(&owner) {
                return Err(format!("primitive {handle} for unexpected {owner}"));
            }
            if !seen.insert(owner) {
                return Err(format!("duplicate primitive for {owner}"));
            }
        }
        if seen.len() != expected.len() {
            let missing: Vec<String> = expected
                .difference(&seen)
                .map(ToString::to_string)
                .collect();
            return Err(format!("missing primitives for {}", missing.join(", ")));
        }
        if self.minimap.engine().live_count() != seen.len() {
            return Err(format!(
                "engine tracks {} handles, surface has {}",
                self.minimap.engine().live_count(),
                seen.len()
            ));
        }
        Ok(())
    }

    /// Panicking form of [`Fixture::check_bijection`].
    #[track_caller]
    pub fn assert_bijection(&self) {
        if let Err(msg) = self.check_bijection() {
            panic!("bijection violated: {msg}");
        }
    }
}
