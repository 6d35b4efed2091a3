use dagnet_core::error::{DagError, ValidationError};
use dagnet_core::types::{Amount, TxHash};

/// Qualitative success probability of a simulated submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    /// Online checks ran and everything passed.
    High,
    /// Structurally valid, but no network handle to verify against.
    Medium,
    /// Something failed or could not be verified.
    Low,
}

/// What a simulation found.
///
/// `balance_after` may be negative: it is a diagnostic, not a balance the
/// network would ever hold. Fields are `None` when the corresponding check
/// could not run (no client handle, or the lookup failed).
#[derive(Debug)]
pub struct SimulationReport {
    pub will_succeed: bool,
    pub validation_errors: Vec<ValidationError>,
    pub environmental_errors: Vec<DagError>,
    /// Canonical hash of `value`; only on detailed runs.
    pub canonical_hash: Option<TxHash>,
    /// Wire size of the signed envelope; only on detailed runs.
    pub estimated_size_bytes: Option<usize>,
    pub balance_before: Option<Amount>,
    pub balance_after: Option<i128>,
    pub parent_reference_fresh: Option<bool>,
    pub confidence: Confidence,
}

impl SimulationReport {
    /// True when an environmental error of the given kind was recorded.
    pub fn has_environmental(&self, kind: &str) -> bool {
        self.environmental_errors.iter().any(|e| e.kind() == kind)
    }
}
