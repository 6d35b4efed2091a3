//! The `{value, proofs}` transaction envelope.
//!
//! [`TransactionValue`] is the signed portion. Its canonical serialization
//! (fixed field order, no whitespace, plain decimal integers, sorted data
//! keys) is the byte sequence every implementation must agree on; the
//! canonical hash is computed over exactly these bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Address, Amount, TransactionRef};

// ── Proof ────────────────────────────────────────────────────────────────────

/// One signature over the canonical hash of `value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Uncompressed public key without the leading `04` byte: 128 hex chars.
    pub id: String,
    /// DER-encoded ECDSA signature, hex.
    pub signature: String,
}

// ── Transaction shapes ───────────────────────────────────────────────────────

/// A native or metagraph token transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferValue {
    pub source: Address,
    pub destination: Address,
    pub amount: Amount,
    pub fee: Amount,
    pub salt: u64,
    pub parent: TransactionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metagraph_id: Option<Address>,
}

/// A metagraph data submission. Carries a JSON payload instead of an amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    pub source: Address,
    pub destination: Address,
    pub fee: Amount,
    pub salt: u64,
    pub parent: TransactionRef,
    pub metagraph_id: Address,
    pub data: Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// The signed portion of an envelope. Callers match on the shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionValue {
    Transfer(TransferValue),
    Data(DataValue),
}

impl TransactionValue {
    pub fn source(&self) -> &Address {
        match self {
            TransactionValue::Transfer(t) => &t.source,
            TransactionValue::Data(d) => &d.source,
        }
    }

    pub fn destination(&self) -> &Address {
        match self {
            TransactionValue::Transfer(t) => &t.destination,
            TransactionValue::Data(d) => &d.destination,
        }
    }

    /// Transfer amount; data submissions carry none.
    pub fn amount(&self) -> Option<Amount> {
        match self {
            TransactionValue::Transfer(t) => Some(t.amount),
            TransactionValue::Data(_) => None,
        }
    }

    pub fn fee(&self) -> Amount {
        match self {
            TransactionValue::Transfer(t) => t.fee,
            TransactionValue::Data(d) => d.fee,
        }
    }

    pub fn salt(&self) -> u64 {
        match self {
            TransactionValue::Transfer(t) => t.salt,
            TransactionValue::Data(d) => d.salt,
        }
    }

    pub fn parent(&self) -> &TransactionRef {
        match self {
            TransactionValue::Transfer(t) => &t.parent,
            TransactionValue::Data(d) => &d.parent,
        }
    }

    pub fn metagraph_id(&self) -> Option<&Address> {
        match self {
            TransactionValue::Transfer(t) => t.metagraph_id.as_ref(),
            TransactionValue::Data(d) => Some(&d.metagraph_id),
        }
    }

    /// Canonical serialization: fields in the fixed declaration order,
    /// no whitespace, integers as plain decimal, data keys sorted.
    ///
    /// This is the exact byte sequence the canonical hash is computed over.
    pub fn canonical_json(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push('{');
        match self {
            TransactionValue::Transfer(t) => {
                push_str_field(&mut out, "source", t.source.as_str());
                out.push(',');
                push_str_field(&mut out, "destination", t.destination.as_str());
                out.push(',');
                push_int_field(&mut out, "amount", t.amount);
                out.push(',');
                push_int_field(&mut out, "fee", t.fee);
                out.push(',');
                push_int_field(&mut out, "salt", t.salt);
                out.push(',');
                push_parent(&mut out, &t.parent);
                if let Some(mid) = &t.metagraph_id {
                    out.push(',');
                    push_str_field(&mut out, "metagraph_id", mid.as_str());
                }
            }
            TransactionValue::Data(d) => {
                push_str_field(&mut out, "source", d.source.as_str());
                out.push(',');
                push_str_field(&mut out, "destination", d.destination.as_str());
                out.push(',');
                push_int_field(&mut out, "fee", d.fee);
                out.push(',');
                push_int_field(&mut out, "salt", d.salt);
                out.push(',');
                push_parent(&mut out, &d.parent);
                out.push(',');
                push_str_field(&mut out, "metagraph_id", d.metagraph_id.as_str());
                out.push_str(",\"data\":");
                push_canonical_value(&mut out, &d.data);
                out.push_str(",\"timestamp\":");
                out.push_str(&d.timestamp.to_string());
            }
        }
        out.push('}');
        out
    }
}

// ── Transaction ──────────────────────────────────────────────────────────────

/// A transaction envelope. Unsigned until `proofs` is non-empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub value: TransactionValue,
    pub proofs: Vec<Proof>,
}

impl Transaction {
    /// Wrap a value with no proofs yet.
    pub fn unsigned(value: TransactionValue) -> Self {
        Self {
            value,
            proofs: Vec::new(),
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.proofs.is_empty()
    }
}

// ── Canonical building blocks ────────────────────────────────────────────────

fn push_str_field(out: &mut String, key: &str, value: &str) {
    out.push('"');
    out.push_str(key);
    out.push_str("\":");
    push_json_string(out, value);
}

fn push_int_field(out: &mut String, key: &str, value: u64) {
    out.push('"');
    out.push_str(key);
    out.push_str("\":");
    out.push_str(&value.to_string());
}

fn push_parent(out: &mut String, parent: &TransactionRef) {
    out.push_str("\"parent\":{\"hash\":");
    push_json_string(out, &parent.hash.to_hex());
    out.push_str(",\"ordinal\":");
    out.push_str(&parent.ordinal.to_string());
    out.push('}');
}

/// UTF-8 string with standard JSON escapes. serde_json's escaping is the
/// reference behavior; delegate to it.
fn push_json_string(out: &mut String, s: &str) {
    out.push_str(&serde_json::to_string(s).expect("string serialization is infallible"));
}

/// Write `v` with object keys in lexicographic order, recursively.
fn push_canonical_value(out: &mut String, v: &Value) {
    match v {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => push_json_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_canonical_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_json_string(out, key);
                out.push(':');
                push_canonical_value(out, &map[*key]);
            }
            out.push('}');
        }
    }
}

/// Canonical size in bytes of an arbitrary JSON value (sorted keys).
pub fn canonical_size(v: &Value) -> usize {
    let mut out = String::new();
    push_canonical_value(&mut out, v);
    out.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn src() -> Address {
        addr("DAG0abcdefghijkmnopqrstuvwxyzABCDEFGHJKL")
    }

    fn dst() -> Address {
        addr("DAG4abcdefghijkmnopqrstuvwxyzABCDEFGHJK4")
    }

    fn transfer() -> TransferValue {
        TransferValue {
            source: src(),
            destination: dst(),
            amount: 100_000_000,
            fee: 0,
            salt: 42,
            parent: TransactionRef::genesis(),
            metagraph_id: None,
        }
    }

    #[test]
    fn canonical_transfer_is_exact() {
        let value = TransactionValue::Transfer(transfer());
        let expected = format!(
            "{{\"source\":\"{}\",\"destination\":\"{}\",\"amount\":100000000,\
             \"fee\":0,\"salt\":42,\"parent\":{{\"hash\":\"{}\",\"ordinal\":0}}}}",
            src(),
            dst(),
            "0".repeat(64),
        );
        assert_eq!(value.canonical_json(), expected);
    }

    #[test]
    fn canonical_includes_metagraph_id_after_parent() {
        let mut t = transfer();
        t.metagraph_id = Some(dst());
        let canonical = TransactionValue::Transfer(t).canonical_json();
        let parent_pos = canonical.find("\"parent\"").unwrap();
        let mid_pos = canonical.find("\"metagraph_id\"").unwrap();
        assert!(mid_pos > parent_pos);
    }

    #[test]
    fn canonical_data_sorts_keys() {
        let value = TransactionValue::Data(DataValue {
            source: src(),
            destination: src(),
            fee: 0,
            salt: 7,
            parent: TransactionRef::genesis(),
            metagraph_id: dst(),
            data: json!({"zeta": 1, "alpha": {"b": 2, "a": [1, 2]}}),
            timestamp: 1_700_000_000_000,
        });
        let canonical = value.canonical_json();
        assert!(canonical.contains("\"data\":{\"alpha\":{\"a\":[1,2],\"b\":2},\"zeta\":1}"));
        assert!(canonical.ends_with(",\"timestamp\":1700000000000}"));
    }

    #[test]
    fn canonical_is_insensitive_to_input_key_order() {
        let a: TransactionValue = serde_json::from_value(json!({
            "source": src().as_str(), "destination": dst().as_str(),
            "amount": 5, "fee": 0, "salt": 1,
            "parent": {"hash": "0".repeat(64), "ordinal": 0}
        }))
        .unwrap();
        let b: TransactionValue = serde_json::from_value(json!({
            "parent": {"ordinal": 0, "hash": "0".repeat(64)},
            "salt": 1, "fee": 0, "amount": 5,
            "destination": dst().as_str(), "source": src().as_str()
        }))
        .unwrap();
        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn untagged_round_trip_keeps_shape() {
        let value = TransactionValue::Transfer(transfer());
        let tx = Transaction::unsigned(value.clone());
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, value);
        assert!(!back.is_signed());
        assert_eq!(back.value.canonical_json(), value.canonical_json());
    }

    #[test]
    fn data_round_trip_deserializes_as_data() {
        let value = TransactionValue::Data(DataValue {
            source: src(),
            destination: src(),
            fee: 0,
            salt: 9,
            parent: TransactionRef::genesis(),
            metagraph_id: dst(),
            data: json!({"sensor": "t-17", "reading": 22.5}),
            timestamp: 1_700_000_000_000,
        });
        let json = serde_json::to_string(&value).unwrap();
        let back: TransactionValue = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, TransactionValue::Data(_)));
    }
}
