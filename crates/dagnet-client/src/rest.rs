//! Wire DTOs for the three HTTP layers.
//!
//! Unknown fields are preserved in each record's `extra` map but never
//! drive SDK logic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dagnet_core::types::{Address, Amount, Ordinal, TransactionRef, TxHash};

// ── L1: balances ─────────────────────────────────────────────────────────────

/// Raw shape of `GET {l1}/addresses/{address}/balance`.
#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    pub balance: Amount,
    #[serde(default)]
    pub ordinal: Ordinal,
    #[serde(rename = "lastTransactionRef", default)]
    pub last_transaction_ref: Option<TransactionRef>,
}

/// Balance plus the last-accepted reference, as callers consume it.
///
/// Addresses with no history report amount 0 and the genesis reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceInfo {
    pub balance: Amount,
    pub ordinal: Ordinal,
    pub last_ref: TransactionRef,
}

impl BalanceInfo {
    pub fn empty() -> Self {
        Self {
            balance: 0,
            ordinal: 0,
            last_ref: TransactionRef::genesis(),
        }
    }
}

impl From<BalanceResponse> for BalanceInfo {
    fn from(raw: BalanceResponse) -> Self {
        let last_ref = raw.last_transaction_ref.unwrap_or_else(TransactionRef::genesis);
        Self {
            balance: raw.balance,
            ordinal: raw.ordinal.max(last_ref.ordinal),
            last_ref,
        }
    }
}

// ── BE: transaction records ──────────────────────────────────────────────────

/// One observed transaction from the block explorer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub source: Address,
    pub destination: Address,
    pub amount: Amount,
    #[serde(default)]
    pub fee: Amount,
    pub parent: TransactionRef,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TransactionRecord {
    pub fn is_incoming(&self, address: &Address) -> bool {
        &self.destination == address
    }

    pub fn is_outgoing(&self, address: &Address) -> bool {
        &self.source == address
    }
}

/// Block-explorer list endpoints wrap their payload in `{"data": […]}`;
/// some deployments return the bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordList<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> RecordList<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            RecordList::Wrapped { data } => data,
            RecordList::Bare(items) => items,
        }
    }
}

// ── L0: node and cluster ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterPeer {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The latest global snapshot, as consumed by the balance tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub ordinal: u64,
    pub hash: Option<String>,
}

impl SnapshotInfo {
    /// The combined endpoint nests the snapshot under `value` on some
    /// deployments and serves it flat on others.
    pub(crate) fn from_value(v: &Value) -> Option<Self> {
        let snapshot = v.get("value").unwrap_or(v);
        let ordinal = snapshot.get("ordinal")?.as_u64()?;
        let hash = snapshot
            .get("hash")
            .and_then(|h| h.as_str())
            .map(str::to_string);
        Some(Self { ordinal, hash })
    }
}

// ── L1: submission ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub hash: TxHash,
}

/// Structured rejection body: `{"error": {"code": …, "message": …}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RejectionBody {
    pub error: RejectionDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn balance_without_history_maps_to_genesis() {
        let raw: BalanceResponse = serde_json::from_value(json!({"balance": 0})).unwrap();
        let info: BalanceInfo = raw.into();
        assert_eq!(info, BalanceInfo::empty());
    }

    #[test]
    fn balance_with_last_ref() {
        let raw: BalanceResponse = serde_json::from_value(json!({
            "balance": 150_000_000u64,
            "ordinal": 7,
            "lastTransactionRef": {"hash": "ab".repeat(32), "ordinal": 7}
        }))
        .unwrap();
        let info: BalanceInfo = raw.into();
        assert_eq!(info.balance, 150_000_000);
        assert_eq!(info.last_ref.ordinal, 7);
    }

    #[test]
    fn record_list_accepts_both_shapes() {
        let wrapped: RecordList<u32> = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        let bare: RecordList<u32> = serde_json::from_value(json!([3])).unwrap();
        assert_eq!(wrapped.into_vec(), vec![1, 2]);
        assert_eq!(bare.into_vec(), vec![3]);
    }

    #[test]
    fn transaction_record_preserves_unknown_fields() {
        let record: TransactionRecord = serde_json::from_value(json!({
            "hash": "cd".repeat(32),
            "source": "DAG0abcdefghijkmnopqrstuvwxyzABCDEFGHJKL",
            "destination": "DAG4abcdefghijkmnopqrstuvwxyzABCDEFGHJK4",
            "amount": 5,
            "fee": 0,
            "parent": {"hash": "0".repeat(64), "ordinal": 0},
            "timestamp": 1_700_000_000_000i64,
            "type": "transfer",
            "snapshotOrdinal": 99
        }))
        .unwrap();
        assert_eq!(record.tx_type.as_deref(), Some("transfer"));
        assert_eq!(record.extra["snapshotOrdinal"], json!(99));
    }

    #[test]
    fn snapshot_parses_flat_and_nested() {
        let flat = SnapshotInfo::from_value(&json!({"ordinal": 12, "hash": "aa"})).unwrap();
        let nested =
            SnapshotInfo::from_value(&json!({"value": {"ordinal": 13}})).unwrap();
        assert_eq!(flat.ordinal, 12);
        assert_eq!(nested.ordinal, 13);
        assert_eq!(nested.hash, None);
    }
}
