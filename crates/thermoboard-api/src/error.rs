use thiserror::Error;

/// Top-level error type for the `thermoboard-api` crate.
///
/// These are the failure shapes a concrete transport reports through.
/// `thermoboard-core` maps them into user-facing diagnostics -- consumers
/// never see raw HTTP status codes or parse failures directly.
#[derive(Debug, Error)]
pub enum ApiError {
    // ── Transport ───────────────────────────────────────────────────
    /// The request never completed (connection refused, DNS failure,
    /// timeout, broken pipe).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server answered but the payload could not be decoded.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Subscription ────────────────────────────────────────────────
    /// The live update subscription could not be established.
    #[error("Subscription failed: {0}")]
    SubscribeFailed(String),

    /// The server ended an established subscription.
    #[error("Subscription closed by server")]
    SubscriptionClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// A server timestamp did not match the documented format.
    #[error("Bad timestamp {value:?}: {message}")]
    BadTimestamp { value: String, message: String },
}

impl ApiError {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::SubscribeFailed(_) | Self::SubscriptionClosed
        )
    }
}
