#![forbid(unsafe_code)]

//! Declarative set of annotations that should currently be marked.
//!
//! # Design
//!
//! [`AnnotationStore`] keeps annotations in insertion order (a `Vec` for
//! order, an `FxHashSet` for membership). Every mutating operation returns
//! the [`StoreEvent`] describing exactly what changed, or `None` when the
//! call changed nothing. The same event is delivered to subscribers in
//! registration order.
//!
//! # Invariants
//!
//! 1. No duplicate keys: `order` and `members` always hold the same set.
//! 2. Events carry only the affected annotations, never the whole store.
//! 3. `version` increments exactly once per effective mutation.
//! 4. Subscribers of a dropped [`Subscription`] are never called again.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: mutating the store from within a subscriber
//!   callback is impossible (the callback only receives `&StoreEvent`).

use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::annotation::{Annotation, AnnotationKind};

/// Annotations affected by one store operation.
pub type AnnotationBatch = SmallVec<[Annotation; 4]>;

/// One store mutation, as reported to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Newly inserted annotations.
    Added(AnnotationBatch),
    /// Annotations that were present and are now gone.
    Removed(AnnotationBatch),
    /// `old` was swapped for `new` in place.
    Replaced { old: Annotation, new: Annotation },
    /// Content unchanged; the listed annotations need repositioning.
    Moved(AnnotationBatch),
    /// Everything was cleared in bulk.
    Reset,
}

impl StoreEvent {
    /// Short operation name, used in pass reports and logs.
    #[must_use]
    pub const fn kind(&self) -> StoreEventKind {
        match self {
            Self::Added(_) => StoreEventKind::Added,
            Self::Removed(_) => StoreEventKind::Removed,
            Self::Replaced { .. } => StoreEventKind::Replaced,
            Self::Moved(_) => StoreEventKind::Moved,
            Self::Reset => StoreEventKind::Reset,
        }
    }
}

/// Payload-free discriminant of a [`StoreEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEventKind {
    Added,
    Removed,
    Replaced,
    Moved,
    Reset,
}

type CallbackRc = Rc<dyn Fn(&StoreEvent)>;
type CallbackWeak = Weak<dyn Fn(&StoreEvent)>;

/// Insertion-ordered, observable set of annotations.
#[derive(Default)]
pub struct AnnotationStore {
    order: Vec<Annotation>,
    members: FxHashSet<Annotation>,
    version: u64,
    /// Weak subscriber callbacks. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak>,
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("annotations", &self.order)
            .field("version", &self.version)
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl AnnotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, annotation: &Annotation) -> bool {
        self.members.contains(annotation)
    }

    /// Annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.order.iter()
    }

    /// Annotations of one kind, in insertion order.
    pub fn of_kind(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> + '_ {
        self.order.iter().filter(move |a| a.kind == kind)
    }

    /// Number of effective mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Insert annotations that are not already present.
    pub fn add(&mut self, annotations: &[Annotation]) -> Option<StoreEvent> {
        let mut added = AnnotationBatch::new();
        for &annotation in annotations {
            if self.members.insert(annotation) {
                self.order.push(annotation);
                added.push(annotation);
            }
        }
        if added.is_empty() {
            return None;
        }
        Some(self.commit(StoreEvent::Added(added)))
    }

    /// Remove the given annotations; absent ones are ignored.
    pub fn remove(&mut self, annotations: &[Annotation]) -> Option<StoreEvent> {
        let mut removed = AnnotationBatch::new();
        for annotation in annotations {
            if self.members.remove(annotation) {
                removed.push(*annotation);
            }
        }
        if removed.is_empty() {
            return None;
        }
        self.order.retain(|a| self.members.contains(a));
        Some(self.commit(StoreEvent::Removed(removed)))
    }

    /// Swap `old` for `new`, keeping `old`'s position.
    ///
    /// Returns `None` when `old` is absent or equal to `new`. If `new` is
    /// already present, `old` is simply dropped from the order.
    pub fn replace(&mut self, old: Annotation, new: Annotation) -> Option<StoreEvent> {
        if old == new || !self.members.remove(&old) {
            return None;
        }
        if self.members.insert(new) {
            if let Some(slot) = self.order.iter_mut().find(|a| **a == old) {
                *slot = new;
            }
        } else {
            self.order.retain(|a| *a != old);
        }
        Some(self.commit(StoreEvent::Replaced { old, new }))
    }

    /// Report that the given annotations' items moved. Content is unchanged.
    pub fn move_items(&mut self, annotations: &[Annotation]) -> Option<StoreEvent> {
        let moved: AnnotationBatch = annotations
            .iter()
            .copied()
            .filter(|a| self.members.contains(a))
            .collect();
        if moved.is_empty() {
            return None;
        }
        Some(self.commit(StoreEvent::Moved(moved)))
    }

    /// Clear everything in bulk.
    pub fn reset(&mut self) -> StoreEvent {
        self.order.clear();
        self.members.clear();
        self.commit(StoreEvent::Reset)
    }

    /// Drop every annotation for which `keep` returns false.
    ///
    /// Subscribers see a single [`StoreEvent::Removed`]; the removed
    /// annotations are also returned.
    pub fn retain(&mut self, mut keep: impl FnMut(&Annotation) -> bool) -> AnnotationBatch {
        let mut removed = AnnotationBatch::new();
        self.order.retain(|a| {
            if keep(a) {
                true
            } else {
                removed.push(*a);
                false
            }
        });
        if !removed.is_empty() {
            for a in &removed {
                self.members.remove(a);
            }
            self.commit(StoreEvent::Removed(removed.clone()));
        }
        removed
    }

    /// Subscribe to store events.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes the callback.
    pub fn subscribe(&mut self, callback: impl Fn(&StoreEvent) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Number of registered subscribers (including dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn commit(&mut self, event: StoreEvent) -> StoreEvent {
        self.version += 1;
        self.subscribers.retain(|w| w.strong_count() > 0);
        let callbacks: Vec<CallbackRc> = self.subscribers.iter().filter_map(|w| w.upgrade()).collect();
        for cb in &callbacks {
            cb(&event);
        }
        event
    }
}

/// RAII guard for a store subscriber.
pub struct Subscription {
    _guard: CallbackRc,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
