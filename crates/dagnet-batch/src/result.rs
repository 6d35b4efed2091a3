//! Batch results and aggregate statistics.

use dagnet_client::{BalanceInfo, ClusterPeer, NodeInfo, TransactionRecord};
use dagnet_core::error::DagError;
use dagnet_core::types::{Ordinal, TxHash};

/// Successful payload of one batch item, tagged by operation family.
#[derive(Clone, Debug)]
pub enum BatchData {
    Balance(BalanceInfo),
    Ordinal(Ordinal),
    Transactions(Vec<TransactionRecord>),
    NodeInfo(NodeInfo),
    ClusterInfo(Vec<ClusterPeer>),
    SubmitHash(TxHash),
}

/// Outcome of one batch item. Timings are measured independently per item.
#[derive(Debug)]
pub struct BatchItemResult {
    pub id: String,
    pub outcome: Result<BatchData, DagError>,
    pub elapsed_ms: u64,
}

impl BatchItemResult {
    pub(crate) fn new(id: String, outcome: Result<BatchData, DagError>, elapsed_ms: u64) -> Self {
        Self {
            id,
            outcome,
            elapsed_ms,
        }
    }

    pub(crate) fn failed(id: String, error: DagError, elapsed_ms: u64) -> Self {
        Self::new(id, Err(error), elapsed_ms)
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Machine-readable error kind for failed items.
    pub fn error_kind(&self) -> Option<&'static str> {
        self.outcome.as_ref().err().map(DagError::kind)
    }
}

/// The whole batch: per-item results in caller order plus aggregates.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<BatchItemResult>,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
    pub execution_time_ms: u64,
    pub concurrent_execution: bool,
}

impl BatchReport {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    /// Percentage of successful items. An empty batch is vacuously 100 %.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 100.0;
        }
        self.successes() as f64 * 100.0 / self.results.len() as f64
    }

    /// Look an item up by its caller-chosen id.
    pub fn get(&self, id: &str) -> Option<&BatchItemResult> {
        self.results.iter().find(|r| r.id == id)
    }
}
