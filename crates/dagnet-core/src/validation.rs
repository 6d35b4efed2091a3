//! Pure input predicates.
//!
//! Every factory and simulator entry point runs these before doing anything
//! else. They are stateless and never touch the network.

use serde_json::Value;

use crate::constants::{ADDRESS_LEN, ADDRESS_PREFIX, ADDRESS_TAIL_LEN, MAX_AMOUNT, MAX_DATA_BYTES};
use crate::envelope::{canonical_size, Transaction, TransactionValue};
use crate::error::ValidationError;
use crate::types::{Address, Amount};

// ── Address ──────────────────────────────────────────────────────────────────

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Check the full address syntax: prefix, length, check digit, base58 tail.
pub fn validate_address_str(s: &str, field: &str) -> Result<(), ValidationError> {
    if !s.starts_with(ADDRESS_PREFIX) {
        return Err(ValidationError::new(
            field,
            format!("must start with {ADDRESS_PREFIX}"),
        ));
    }
    if s.len() != ADDRESS_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be {ADDRESS_LEN} characters, got {}", s.len()),
        ));
    }
    let check_char = s.as_bytes()[3] as char;
    let Some(check_digit) = check_char.to_digit(10) else {
        return Err(ValidationError::new(
            field,
            format!("check digit position holds {check_char:?}, expected 0-9"),
        ));
    };
    let tail = &s[4..];
    debug_assert_eq!(tail.len(), ADDRESS_TAIL_LEN);
    if let Some(bad) = tail.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(ValidationError::new(
            field,
            format!("tail contains non-base58 character {bad:?}"),
        ));
    }
    if bs58::decode(tail).into_vec().is_err() {
        return Err(ValidationError::new(field, "tail is not parseable base58"));
    }
    let digit_sum: u32 = tail.chars().filter_map(|c| c.to_digit(10)).sum();
    if digit_sum % 9 != check_digit {
        return Err(ValidationError::new(
            field,
            format!("check digit {check_digit} does not match digit sum {digit_sum} mod 9"),
        ));
    }
    Ok(())
}

/// Re-check an already-constructed address under a specific field name.
pub fn validate_address(address: &Address, field: &str) -> Result<(), ValidationError> {
    validate_address_str(address.as_str(), field)
}

// ── Amounts ──────────────────────────────────────────────────────────────────

/// `0 ≤ amount < 2⁶³`.
pub fn validate_amount(amount: Amount, field: &str) -> Result<(), ValidationError> {
    if amount >= MAX_AMOUNT {
        return Err(ValidationError::new(
            field,
            format!("{amount} is out of range (must be below 2^63)"),
        ));
    }
    Ok(())
}

/// Token transfers additionally reject zero.
pub fn validate_transfer_amount(amount: Amount) -> Result<(), ValidationError> {
    validate_amount(amount, "amount")?;
    if amount == 0 {
        return Err(ValidationError::new(
            "amount",
            "token transfers must move a non-zero amount",
        ));
    }
    Ok(())
}

pub fn validate_salt(salt: u64) -> Result<(), ValidationError> {
    if salt >= MAX_AMOUNT {
        return Err(ValidationError::new(
            "salt",
            format!("{salt} is out of range (must be below 2^63)"),
        ));
    }
    Ok(())
}

pub fn validate_timestamp(timestamp_ms: i64) -> Result<(), ValidationError> {
    if timestamp_ms < 0 {
        return Err(ValidationError::new(
            "timestamp",
            format!("{timestamp_ms} is negative"),
        ));
    }
    Ok(())
}

// ── Data payloads ────────────────────────────────────────────────────────────

/// Data payloads must be JSON objects of at most 64 KiB canonical size.
pub fn validate_data_payload(data: &Value) -> Result<(), ValidationError> {
    if !data.is_object() {
        return Err(ValidationError::new(
            "data",
            "payload root must be a JSON object",
        ));
    }
    let size = canonical_size(data);
    if size > MAX_DATA_BYTES {
        return Err(ValidationError::new(
            "data",
            format!("canonical payload is {size} bytes, limit is {MAX_DATA_BYTES}"),
        ));
    }
    Ok(())
}

// ── Envelope ─────────────────────────────────────────────────────────────────

/// Validate the signed portion of an envelope: addresses, ranges, payload.
pub fn validate_value(value: &TransactionValue) -> Result<(), ValidationError> {
    validate_address(value.source(), "source")?;
    validate_address(value.destination(), "destination")?;
    if let Some(mid) = value.metagraph_id() {
        validate_address(mid, "metagraph_id")?;
    }
    validate_amount(value.fee(), "fee")?;
    validate_salt(value.salt())?;
    match value {
        TransactionValue::Transfer(t) => validate_transfer_amount(t.amount)?,
        TransactionValue::Data(d) => {
            validate_data_payload(&d.data)?;
            validate_timestamp(d.timestamp)?;
        }
    }
    Ok(())
}

/// Structural checks for a submission-ready envelope: a valid value plus
/// well-formed, non-empty proofs. Whether a proof's key actually derives
/// `source` is a cryptographic check and lives with the codec.
pub fn validate_envelope_structure(tx: &Transaction) -> Result<(), ValidationError> {
    validate_value(&tx.value)?;
    if tx.proofs.is_empty() {
        return Err(ValidationError::new("proofs", "envelope carries no proofs"));
    }
    for (i, proof) in tx.proofs.iter().enumerate() {
        if proof.id.len() != 128 || hex::decode(&proof.id).is_err() {
            return Err(ValidationError::new(
                format!("proofs[{i}].id"),
                "expected 128 hex chars (uncompressed public key without 04)",
            ));
        }
        if proof.signature.is_empty() || hex::decode(&proof.signature).is_err() {
            return Err(ValidationError::new(
                format!("proofs[{i}].signature"),
                "expected DER signature hex",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Proof, TransferValue};
    use crate::types::TransactionRef;
    use serde_json::json;

    const SRC: &str = "DAG0abcdefghijkmnopqrstuvwxyzABCDEFGHJKL";
    const DST: &str = "DAG4abcdefghijkmnopqrstuvwxyzABCDEFGHJK4";

    fn transfer(amount: Amount) -> TransactionValue {
        TransactionValue::Transfer(TransferValue {
            source: SRC.parse().unwrap(),
            destination: DST.parse().unwrap(),
            amount,
            fee: 0,
            salt: 1,
            parent: TransactionRef::genesis(),
            metagraph_id: None,
        })
    }

    #[test]
    fn address_accepts_valid() {
        assert!(validate_address_str(SRC, "address").is_ok());
        assert!(validate_address_str(DST, "address").is_ok());
    }

    #[test]
    fn address_rejects_wrong_prefix_length_and_charset() {
        assert!(validate_address_str("ETH0abc", "address").is_err());
        assert!(validate_address_str(&format!("DAG0{}", "a".repeat(35)), "address").is_err());
        // 'l' is not in the base58 alphabet.
        assert!(
            validate_address_str(&format!("DAG0{}l", "a".repeat(35)), "address").is_err()
        );
    }

    #[test]
    fn amount_boundaries() {
        assert!(validate_amount(MAX_AMOUNT - 1, "amount").is_ok());
        assert!(validate_amount(MAX_AMOUNT, "amount").is_err());
        assert!(validate_transfer_amount(0).is_err());
        assert!(validate_transfer_amount(1).is_ok());
    }

    #[test]
    fn data_payload_boundaries() {
        assert!(validate_data_payload(&json!({"k": "v"})).is_ok());
        assert!(validate_data_payload(&json!(null)).is_err());
        assert!(validate_data_payload(&json!([1, 2, 3])).is_err());

        // Exactly 64 KiB canonical is accepted; one byte more is not.
        // {"k":"<filler>"} has 8 bytes of canonical overhead.
        let filler = "x".repeat(MAX_DATA_BYTES - 8);
        assert!(validate_data_payload(&json!({ "k": filler })).is_ok());
        let filler = "x".repeat(MAX_DATA_BYTES - 7);
        assert!(validate_data_payload(&json!({ "k": filler })).is_err());
    }

    #[test]
    fn value_rejects_zero_transfer() {
        let err = validate_value(&transfer(0)).unwrap_err();
        assert_eq!(err.field, "amount");
        assert!(validate_value(&transfer(100_000_000)).is_ok());
    }

    #[test]
    fn envelope_requires_proofs() {
        let tx = Transaction::unsigned(transfer(5));
        assert_eq!(
            validate_envelope_structure(&tx).unwrap_err().field,
            "proofs"
        );

        let signed = Transaction {
            value: transfer(5),
            proofs: vec![Proof {
                id: "ab".repeat(64),
                signature: "3045".into(),
            }],
        };
        assert!(validate_envelope_structure(&signed).is_ok());
    }

    #[test]
    fn envelope_rejects_malformed_proof_id() {
        let tx = Transaction {
            value: transfer(5),
            proofs: vec![Proof {
                id: "zz".repeat(64),
                signature: "3045".into(),
            }],
        };
        assert!(validate_envelope_structure(&tx).is_err());
    }
}
