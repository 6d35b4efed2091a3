use thiserror::Error;

/// A failed input check: which field was bad and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The closed error taxonomy surfaced to SDK callers.
///
/// Every variant carries a machine-readable kind (see [`DagError::kind`]),
/// a human message, and structured details where they exist. Callers are
/// expected to switch on kind.
#[derive(Debug, Error)]
pub enum DagError {
    // ── Input errors ─────────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("rejected by the network ({code}): {message}")]
    Rejected { code: String, message: String },

    // ── Environmental errors ─────────────────────────────────────────────────
    #[error("insufficient balance: need {need} units, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("parent reference stale: ordinal {got} is behind current ordinal {current}")]
    ParentReferenceStale { got: u64, current: u64 },

    // ── Stream notifications ─────────────────────────────────────────────────
    #[error("push endpoint unavailable; degraded to polling mode")]
    DegradedToPolling,

    #[error("event stream closed")]
    StreamClosed,
}

impl DagError {
    /// Machine-readable kind string, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            DagError::Validation(_) => "validation",
            DagError::InvalidKey(_) => "invalid_key",
            DagError::SigningFailed(_) => "signing_failed",
            DagError::ConnectionFailed(_) => "connection_failed",
            DagError::Timeout { .. } => "timeout",
            DagError::Http { .. } => "http_error",
            DagError::InvalidResponse(_) => "invalid_response",
            DagError::Rejected { .. } => "rejected",
            DagError::InsufficientBalance { .. } => "insufficient_balance",
            DagError::ParentReferenceStale { .. } => "parent_reference_stale",
            DagError::DegradedToPolling => "degraded_to_polling",
            DagError::StreamClosed => "stream_closed",
        }
    }

    /// True for failures the transport retry policy may retry:
    /// timeouts, connection failures, and HTTP 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            DagError::Timeout { .. } | DagError::ConnectionFailed(_) => true,
            DagError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
