#![forbid(unsafe_code)]

//! Test harness for `scrollmap-core`.
//!
//! Provides deterministic fakes for the host collaborators and a
//! [`Fixture`] that drives a [`scrollmap_core::Minimap`] through them,
//! including the host loop's idle re-runs.

pub mod fakes;
pub mod fixture;

pub use fakes::{FakeList, IdleQueue, Page, RecordingCommands, RecordingSurface, SurfaceOp};
pub use fixture::Fixture;

/// Route `tracing` output to the test writer. Safe to call repeatedly.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}
