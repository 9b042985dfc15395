#![forbid(unsafe_code)]

//! Error types.
//!
//! Only contract violations are errors. Unmeasurable geometry, stale
//! annotations and a detached surface are expected transient states and are
//! handled inside the engine.

use std::fmt;

/// Errors that abort a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The list adapter delivered a change action outside the closed set
    /// `Add | Remove | Replace | Move | Reset`.
    UnrecognizedListChange { action: u32 },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedListChange { action } => write!(
                f,
                "unrecognized list change action {action}: expected add, remove, replace, move or reset"
            ),
        }
    }
}

impl std::error::Error for SyncError {}

/// Errors from configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Marker style was not `line` or `region`.
    InvalidStyle(String),
    /// Layout strategy was not `measured` or `counted`.
    InvalidLayout(String),
    /// A numeric setting failed to parse or was out of range.
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStyle(s) => write!(f, "invalid marker style '{s}' (expected line or region)"),
            Self::InvalidLayout(s) => {
                write!(f, "invalid layout strategy '{s}' (expected measured or counted)")
            }
            Self::InvalidNumber { key, value } => write!(f, "invalid value '{value}' for {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_names_the_action() {
        let msg = SyncError::UnrecognizedListChange { action: 9 }.to_string();
        assert!(msg.contains("action 9"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidNumber {
            key: "SCROLLMAP_MIN_REGION",
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "invalid value 'abc' for SCROLLMAP_MIN_REGION");
    }
}
