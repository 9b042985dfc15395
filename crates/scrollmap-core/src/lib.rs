#![forbid(unsafe_code)]

//! Scroll-track annotation markers for long, changing lists.
//!
//! # Role
//! `scrollmap-core` draws thin markers on a list's scroll track showing where
//! interesting items (the selection, live search hits) sit in the full
//! scrollable extent, including items that are off-screen. Clicking a
//! marker selects its item and scrolls it to the viewport center.
//!
//! # Moving parts
//! - [`AnnotationStore`]: the declarative `(item, kind)` set, insertion
//!   ordered, reporting each mutation as a [`StoreEvent`].
//! - [`PassGeometry`]: item geometry to marker geometry, memoized per pass.
//! - [`SyncEngine`]: prunes, applies events, repositions, and schedules one
//!   coalesced idle re-run while geometry is unknown.
//! - [`handle_click`]: marker clicks and track paging.
//! - [`Minimap`]: facade owning the store and the engine.
//!
//! # Host contract
//! The host binds [`ListAdapter`], [`GeometryProvider`], [`OverlaySurface`],
//! [`IdleScheduler`] and [`ListCommands`] to its toolkit and passes them per
//! call through [`Host`]. Everything runs on the UI thread.

pub mod annotation;
pub mod config;
pub mod error;
pub mod host;
pub mod interaction;
pub mod logging;
pub mod minimap;
pub mod position;
pub mod search;
pub mod store;
pub mod sync;

pub use annotation::{Annotation, AnnotationKind, ItemId, Rgb};
pub use config::{LayoutStrategy, MarkerStyle, MinimapConfig};
pub use error::{ConfigError, SyncError};
pub use host::{
    GeometryProvider, Host, IdleScheduler, ItemExtent, ListAdapter, ListChange, ListChangeKind,
    ListCommands, OverlayClick, OverlaySurface, Primitive, PrimitiveHandle, Shape,
};
pub use interaction::{ClickOutcome, SelectionChange, center_offset, handle_click};
pub use minimap::{Minimap, PassReports};
pub use position::{GeometrySample, PassGeometry, Placement, shape_for};
pub use search::{MIN_QUERY_CHARS, SearchQuery, Searchable};
pub use store::{AnnotationBatch, AnnotationStore, StoreEvent, StoreEventKind, Subscription};
pub use sync::{MarkerState, PassReport, SyncEngine, Trigger};
