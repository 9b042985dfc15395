#![forbid(unsafe_code)]

//! Sync engine: keeps overlay primitives consistent with the store, the
//! list and the measured layout.
//!
//! # Pass structure
//!
//! Every entry point runs one reconciliation pass:
//!
//! 1. **Prune**: annotations whose item left the list are dropped from the
//!    store and their primitives destroyed. Always first.
//! 2. **Apply** the triggering event (destroy removed/replaced primitives,
//!    register newly added annotations as `Pending`).
//! 3. **Reposition** every remaining annotation through the position
//!    calculator. Primitives are only touched when their shape changed.
//! 4. **Retry**: if any placement was provisional, schedule exactly one
//!    idle re-run. Further triggers before it fires coalesce into it.
//!
//! # Invariants
//!
//! 1. After a completed pass on an attached surface, the live primitives are
//!    exactly `{a in store : a.item in list}`, one per annotation.
//! 2. A pass with no intervening state change mutates nothing.
//! 3. At most one idle re-run is outstanding (`retry_pending`).
//! 4. Consecutive idle re-runs are bounded by `max_idle_retries`; any other
//!    trigger re-arms the budget.
//! 5. While the surface is detached no primitive is added, updated or
//!    removed. Removals are queued and flushed on attach; the surface keeps
//!    its primitives across a detach.
//!
//! # Marker lifecycle
//!
//! ```text
//!  Absent ──add──▶ Pending ──exact geometry──▶ Rendered
//!     ▲               │  ▲                         │
//!     └──remove/prune─┘  └──geometry lost──────────┘
//! ```

use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, error, trace, warn};

use crate::annotation::{Annotation, ItemId};
use crate::config::MinimapConfig;
use crate::error::SyncError;
use crate::host::{Host, ListChange, ListChangeKind, Primitive, PrimitiveHandle};
use crate::position::PassGeometry;
use crate::store::{AnnotationStore, StoreEvent, StoreEventKind};

/// Scheduling state of one annotation's marker. Absent annotations have no
/// state at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerState {
    /// Known, but not yet placed with exact geometry.
    Pending,
    /// Placed from the item's own measured geometry.
    Rendered,
}

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Store(StoreEventKind),
    List(ListChangeKind),
    SizeChanged,
    Deferred,
    SurfaceAttached,
    Explicit,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub trigger: Trigger,
    /// Annotations dropped because their item left the list.
    pub pruned: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Placements computed without the item's own geometry.
    pub provisional: usize,
    /// Whether this pass scheduled the idle re-run.
    pub retry_scheduled: bool,
    /// Surface was detached; primitive work waits for attachment.
    pub awaiting_surface: bool,
}

impl PassReport {
    fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            pruned: 0,
            created: 0,
            updated: 0,
            removed: 0,
            provisional: 0,
            retry_scheduled: false,
            awaiting_surface: false,
        }
    }

    /// Number of primitive mutations issued to the surface.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.removed
    }

    /// True if the pass changed nothing on the surface.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.mutations() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    state: MarkerState,
    handle: Option<PrimitiveHandle>,
    primitive: Option<Primitive>,
}

impl Marker {
    const fn pending() -> Self {
        Self {
            state: MarkerState::Pending,
            handle: None,
            primitive: None,
        }
    }
}

/// Reconciliation engine. Owns the marker table; borrows everything else
/// per call.
#[derive(Debug)]
pub struct SyncEngine {
    config: MinimapConfig,
    markers: FxHashMap<Annotation, Marker>,
    by_handle: FxHashMap<PrimitiveHandle, Annotation>,
    retry_pending: bool,
    idle_retries: u32,
    awaiting_surface: bool,
    /// Handles destroyed while the surface was detached.
    detached_removals: Vec<PrimitiveHandle>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(config: MinimapConfig) -> Self {
        Self {
            config,
            markers: FxHashMap::default(),
            by_handle: FxHashMap::default(),
            retry_pending: false,
            idle_retries: 0,
            awaiting_surface: false,
            detached_removals: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MinimapConfig {
        &self.config
    }

    /// Scheduling state of `annotation`'s marker; `None` means Absent.
    #[must_use]
    pub fn state_of(&self, annotation: &Annotation) -> Option<MarkerState> {
        self.markers.get(annotation).map(|m| m.state)
    }

    /// Last primitive handed to the surface for `annotation`.
    #[must_use]
    pub fn primitive_of(&self, annotation: &Annotation) -> Option<&Primitive> {
        self.markers
            .get(annotation)
            .and_then(|m| m.handle.and(m.primitive.as_ref()))
    }

    /// Annotation owning a live primitive.
    #[must_use]
    pub fn annotation_for(&self, handle: PrimitiveHandle) -> Option<Annotation> {
        self.by_handle.get(&handle).copied()
    }

    /// Number of primitives currently on the surface.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether an idle re-run is scheduled and has not fired yet.
    #[must_use]
    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Whether a pass ran while the surface was detached and has not been
    /// followed by [`SyncEngine::on_surface_attached`] yet.
    #[must_use]
    pub fn awaiting_surface(&self) -> bool {
        self.awaiting_surface
    }

    /// Handle a store mutation.
    pub fn on_store_event(
        &mut self,
        event: &StoreEvent,
        store: &mut AnnotationStore,
        host: &mut Host<'_>,
    ) -> PassReport {
        self.pass(Trigger::Store(event.kind()), Some(event), store, host)
    }

    /// Handle a list mutation. Indices may have shifted for every item, so
    /// this always repositions everything.
    pub fn on_list_changed(
        &mut self,
        change: &ListChange,
        store: &mut AnnotationStore,
        host: &mut Host<'_>,
    ) -> PassReport {
        debug!(kind = ?change.kind, items = change.items.len(), "list changed");
        self.pass(Trigger::List(change.kind), None, store, host)
    }

    /// Handle a list mutation delivered as a raw action code.
    ///
    /// An unknown code aborts before any state is touched.
    pub fn on_raw_list_change(
        &mut self,
        action: u32,
        items: &[ItemId],
        store: &mut AnnotationStore,
        host: &mut Host<'_>,
    ) -> Result<PassReport, SyncError> {
        let change = ListChange::from_raw(action, items).inspect_err(|err| {
            error!(action, %err, "list adapter contract violation");
        })?;
        Ok(self.on_list_changed(&change, store, host))
    }

    /// Handle a change of the overall scrollable height.
    pub fn on_size_changed(&mut self, store: &mut AnnotationStore, host: &mut Host<'_>) -> PassReport {
        self.pass(Trigger::SizeChanged, None, store, host)
    }

    /// The idle re-run requested through [`crate::host::IdleScheduler`].
    ///
    /// Reads current state; harmless when nothing is left to fix.
    pub fn run_deferred(&mut self, store: &mut AnnotationStore, host: &mut Host<'_>) -> PassReport {
        self.retry_pending = false;
        self.pass(Trigger::Deferred, None, store, host)
    }

    /// The surface became available (again). Removals queued while it was
    /// detached are flushed, then a full pass places everything. Repeated
    /// calls on an attached surface are plain passes.
    pub fn on_surface_attached(
        &mut self,
        store: &mut AnnotationStore,
        host: &mut Host<'_>,
    ) -> PassReport {
        let mut flushed = 0;
        if host.surface.is_attached() {
            for handle in self.detached_removals.drain(..) {
                host.surface.remove_primitive(handle);
                flushed += 1;
            }
        }
        debug!(was_waiting = self.awaiting_surface, flushed, "surface attached");
        self.awaiting_surface = false;
        let mut report = self.pass(Trigger::SurfaceAttached, None, store, host);
        report.removed += flushed;
        report
    }

    /// Full reconciliation without a specific trigger.
    pub fn reconcile(&mut self, store: &mut AnnotationStore, host: &mut Host<'_>) -> PassReport {
        self.pass(Trigger::Explicit, None, store, host)
    }

    fn pass(
        &mut self,
        trigger: Trigger,
        event: Option<&StoreEvent>,
        store: &mut AnnotationStore,
        host: &mut Host<'_>,
    ) -> PassReport {
        let _span = debug_span!("scrollmap.reconcile", trigger = ?trigger).entered();
        let mut report = PassReport::new(trigger);

        if trigger == Trigger::Deferred {
            self.idle_retries = self.idle_retries.saturating_add(1);
        } else {
            self.idle_retries = 0;
        }

        let attached = host.surface.is_attached();
        let mut geo = PassGeometry::new(host.list, host.geometry, host.surface.height());

        // 1. Prune stale annotations.
        let pruned = store.retain(|a| geo.contains(a.item));
        report.pruned = pruned.len();
        for a in &pruned {
            self.destroy(a, host, &mut report);
        }

        // 2. Apply the event.
        match event {
            Some(StoreEvent::Removed(batch)) => {
                for a in batch {
                    self.destroy(a, host, &mut report);
                }
            }
            Some(StoreEvent::Replaced { old, .. }) => self.destroy(old, host, &mut report),
            Some(StoreEvent::Reset) => {
                let all: Vec<Annotation> = self.markers.keys().copied().collect();
                for a in &all {
                    self.destroy(a, host, &mut report);
                }
            }
            Some(StoreEvent::Added(_) | StoreEvent::Moved(_)) | None => {}
        }
        // Anything else the store no longer holds.
        let orphans: Vec<Annotation> = self
            .markers
            .keys()
            .filter(|a| !store.contains(a))
            .copied()
            .collect();
        for a in &orphans {
            self.destroy(a, host, &mut report);
        }

        if !attached {
            // Keep the table in step with the store; primitives come later.
            for a in store.iter() {
                self.markers.entry(*a).or_insert_with(Marker::pending);
            }
            self.awaiting_surface = true;
            report.awaiting_surface = true;
            debug!(pending = self.markers.len(), "surface detached, deferring primitives");
            return report;
        }

        // 3. Reposition everything that remains.
        let config = self.config;
        for a in store.iter() {
            let Some(placement) = geo.place(a.item, &config) else {
                continue;
            };
            let primitive = Primitive {
                shape: placement.shape,
                color: a.kind.color(),
                thickness: config.line_thickness,
                clickable: a.kind.is_clickable(),
            };
            let marker = self.markers.entry(*a).or_insert_with(Marker::pending);
            match marker.handle {
                None => {
                    let handle = host.surface.add_primitive(&primitive);
                    marker.handle = Some(handle);
                    marker.primitive = Some(primitive);
                    self.by_handle.insert(handle, *a);
                    report.created += 1;
                    trace!(annotation = %a, handle = %handle, shape = ?primitive.shape, "primitive created");
                }
                Some(handle) if marker.primitive != Some(primitive) => {
                    host.surface.update_primitive(handle, &primitive);
                    marker.primitive = Some(primitive);
                    report.updated += 1;
                    trace!(annotation = %a, handle = %handle, shape = ?primitive.shape, "primitive moved");
                }
                Some(_) => {}
            }
            marker.state = if placement.has_geometry {
                MarkerState::Rendered
            } else {
                report.provisional += 1;
                MarkerState::Pending
            };
        }

        // 4. Schedule one idle re-run for provisional placements.
        if report.provisional > 0 && !self.retry_pending {
            if self.idle_retries < self.config.max_idle_retries {
                host.scheduler.schedule_idle();
                self.retry_pending = true;
                report.retry_scheduled = true;
            } else {
                warn!(
                    provisional = report.provisional,
                    retries = self.idle_retries,
                    "geometry still unknown, waiting for the next layout change"
                );
            }
        }

        debug!(
            pruned = report.pruned,
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            provisional = report.provisional,
            retry = report.retry_scheduled,
            measured = geo.measure_calls(),
            "pass complete"
        );
        report
    }

    fn destroy(&mut self, annotation: &Annotation, host: &mut Host<'_>, report: &mut PassReport) {
        let Some(marker) = self.markers.remove(annotation) else {
            return;
        };
        if let Some(handle) = marker.handle {
            self.by_handle.remove(&handle);
            if host.surface.is_attached() {
                host.surface.remove_primitive(handle);
                report.removed += 1;
                trace!(annotation = %annotation, handle = %handle, "primitive removed");
            } else {
                self.detached_removals.push(handle);
                trace!(annotation = %annotation, handle = %handle, "primitive removal queued");
            }
        }
    }
}
