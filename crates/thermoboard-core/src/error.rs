// ── Core error types ──
//
// User-facing errors from thermoboard-core. Transport failures arrive as
// `ApiError` and are wrapped, never exposed raw; dropped events
// (unknown device, badge mismatch) are deliberately NOT errors -- see
// `store::ApplyOutcome`.

use thiserror::Error;

use thermoboard_api::ApiError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation that needs the global configuration ran before the
    /// first successful config load (roster capacity is unknown).
    #[error("Configuration has not loaded yet")]
    NotReady,

    /// A server fetch or subscribe failed. Previous state is retained;
    /// the caller owns retry policy.
    #[error("Server request failed: {0}")]
    Server(#[from] ApiError),

    /// The server returned a configuration violating `min < max`.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// `start` was called on a monitor that is already running.
    #[error("Monitor already started")]
    AlreadyStarted,

    /// The monitor has been shut down; no further commands are accepted.
    #[error("Monitor stopped")]
    Stopped,
}

impl CoreError {
    /// Returns `true` if the underlying cause is transient and a caller
    /// retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Server(e) if e.is_transient())
    }
}
