//! Canonical serialization cases: exact byte sequences, escaping, and
//! insensitivity to input representation.

use serde_json::json;

use dagnet_core::envelope::{DataValue, TransactionValue, TransferValue};
use dagnet_core::types::{Address, TransactionRef, TxHash};

const SRC: &str = "DAG0abcdefghijkmnopqrstuvwxyzABCDEFGHJKL";
const DST: &str = "DAG4abcdefghijkmnopqrstuvwxyzABCDEFGHJK4";

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn parent(ordinal: u64) -> TransactionRef {
    TransactionRef::new(TxHash::from_bytes([0xab; 32]), ordinal)
}

#[test]
fn metagraph_transfer_canonical_string() {
    let value = TransactionValue::Transfer(TransferValue {
        source: addr(SRC),
        destination: addr(DST),
        amount: 123,
        fee: 1,
        salt: 9_007_199_254_740_993, // exceeds 2^53: decimal must stay exact
        parent: parent(17),
        metagraph_id: Some(addr(DST)),
    });
    let expected = format!(
        "{{\"source\":\"{SRC}\",\"destination\":\"{DST}\",\"amount\":123,\"fee\":1,\
         \"salt\":9007199254740993,\"parent\":{{\"hash\":\"{}\",\"ordinal\":17}},\
         \"metagraph_id\":\"{DST}\"}}",
        "ab".repeat(32)
    );
    assert_eq!(value.canonical_json(), expected);
}

#[test]
fn data_submission_canonical_string_with_escapes() {
    let value = TransactionValue::Data(DataValue {
        source: addr(SRC),
        destination: addr(SRC),
        fee: 0,
        salt: 5,
        parent: TransactionRef::genesis(),
        metagraph_id: addr(DST),
        data: json!({"note": "line\nbreak \"quoted\"", "n": -3}),
        timestamp: 1_700_000_000_000,
    });
    let canonical = value.canonical_json();
    // Standard JSON escapes, keys sorted, no whitespace.
    assert!(canonical.contains("\"data\":{\"n\":-3,\"note\":\"line\\nbreak \\\"quoted\\\"\"}"));
    assert!(!canonical.contains(": "));
    assert!(canonical.ends_with(",\"timestamp\":1700000000000}"));
}

#[test]
fn canonical_hash_inputs_differ_between_shapes() {
    let transfer = TransactionValue::Transfer(TransferValue {
        source: addr(SRC),
        destination: addr(DST),
        amount: 1,
        fee: 0,
        salt: 1,
        parent: TransactionRef::genesis(),
        metagraph_id: None,
    });
    let data = TransactionValue::Data(DataValue {
        source: addr(SRC),
        destination: addr(DST),
        fee: 0,
        salt: 1,
        parent: TransactionRef::genesis(),
        metagraph_id: addr(DST),
        data: json!({}),
        timestamp: 0,
    });
    assert_ne!(transfer.canonical_json(), data.canonical_json());
}

#[test]
fn wire_round_trip_preserves_canonical_bytes() {
    let value = TransactionValue::Data(DataValue {
        source: addr(SRC),
        destination: addr(SRC),
        fee: 0,
        salt: 77,
        parent: parent(3),
        metagraph_id: addr(DST),
        data: json!({"b": [1, {"y": 2, "x": 1}], "a": true}),
        timestamp: 42,
    });
    let wire = serde_json::to_string(&value).unwrap();
    let back: TransactionValue = serde_json::from_str(&wire).unwrap();
    assert_eq!(back.canonical_json(), value.canonical_json());
}

#[test]
fn nested_array_and_object_ordering_is_stable() {
    let scrambled: TransactionValue = serde_json::from_value(json!({
        "timestamp": 1,
        "data": {"z": 1, "a": {"k2": [3, 2, 1], "k1": null}},
        "metagraph_id": DST,
        "parent": {"hash": "0".repeat(64), "ordinal": 0},
        "salt": 1,
        "fee": 0,
        "destination": SRC,
        "source": SRC
    }))
    .unwrap();
    let canonical = scrambled.canonical_json();
    // Arrays keep their order; object keys sort.
    assert!(canonical.contains("\"data\":{\"a\":{\"k1\":null,\"k2\":[3,2,1]},\"z\":1}"));
    assert!(canonical.starts_with(&format!("{{\"source\":\"{SRC}\"")));
}
