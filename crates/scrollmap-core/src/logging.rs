#![forbid(unsafe_code)]

//! Logging facade.
//!
//! The crate logs through `tracing`. Spans and events use the
//! `scrollmap.*` naming; one `scrollmap.reconcile` span wraps every pass.
//!
//! With the `tracing-json` feature, [`init_json_logging`] installs a JSON
//! subscriber filtered by `RUST_LOG` (default `info`).

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Install a global JSON subscriber. Returns `false` if one was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
