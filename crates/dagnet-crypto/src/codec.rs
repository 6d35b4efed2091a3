//! Canonical hashing and signature encoding.

use libsecp256k1::{Message, PublicKey, PublicKeyFormat, Signature};
use sha2::{Digest, Sha512};

use dagnet_core::envelope::{Transaction, TransactionValue};
use dagnet_core::error::DagError;
use dagnet_core::types::TxHash;
use dagnet_core::validation::validate_envelope_structure;

use crate::address::{address_from_public_key, sha256};

// ── Canonical hash ───────────────────────────────────────────────────────────

/// SHA-512 truncated to its first 32 bytes.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// The canonical hash of an envelope's `value`: SHA-512/256 over the
/// canonical serialization. Every implementation must agree bit-exactly.
pub fn canonical_hash(value: &TransactionValue) -> TxHash {
    TxHash::from_bytes(sha512_256(value.canonical_json().as_bytes()))
}

// ── Signature encoding ───────────────────────────────────────────────────────

/// Strict DER with low-S enforcement (`s ≤ n/2`).
pub fn der_encode_signature(signature: &Signature) -> Vec<u8> {
    let mut normalized = signature.clone();
    normalized.normalize_s();
    normalized.serialize_der().as_ref().to_vec()
}

/// Hex proof id: the uncompressed point without its leading `04` byte.
pub fn proof_id(public_key: &PublicKey) -> String {
    hex::encode(&public_key.serialize()[1..])
}

/// Parse a proof id back into a public key.
pub fn public_key_from_proof_id(id: &str) -> Result<PublicKey, DagError> {
    let raw = hex::decode(id)
        .map_err(|e| DagError::InvalidKey(format!("proof id is not hex: {e}")))?;
    if raw.len() != 64 {
        return Err(DagError::InvalidKey(format!(
            "proof id must be 64 bytes of point data, got {}",
            raw.len()
        )));
    }
    let mut full = Vec::with_capacity(65);
    full.push(0x04);
    full.extend_from_slice(&raw);
    PublicKey::parse_slice(&full, Some(PublicKeyFormat::Full))
        .map_err(|e| DagError::InvalidKey(format!("proof id is not a curve point: {e:?}")))
}

// ── Verification ─────────────────────────────────────────────────────────────

/// Verify one DER-hex signature over `message` (hashed with SHA-256 before
/// the curve operation, matching the signing side).
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    der_hex: &str,
) -> Result<(), DagError> {
    let der = hex::decode(der_hex)
        .map_err(|e| DagError::InvalidResponse(format!("signature is not hex: {e}")))?;
    let signature = Signature::parse_der(&der)
        .map_err(|e| DagError::InvalidResponse(format!("signature is not DER: {e:?}")))?;
    let digest = Message::parse(&sha256(message));
    if libsecp256k1::verify(&digest, &signature, public_key) {
        Ok(())
    } else {
        Err(DagError::InvalidResponse("signature does not verify".into()))
    }
}

/// Full envelope verification: structure, every proof's signature over the
/// canonical hash, and at least one proof whose key derives `source`.
pub fn verify_transaction(tx: &Transaction) -> Result<(), DagError> {
    validate_envelope_structure(tx)?;
    let hash = canonical_hash(&tx.value);
    let mut source_proven = false;
    for proof in &tx.proofs {
        let public_key = public_key_from_proof_id(&proof.id)?;
        verify_signature(&public_key, hash.as_bytes(), &proof.signature)?;
        if &address_from_public_key(&public_key) == tx.value.source() {
            source_proven = true;
        }
    }
    if !source_proven {
        return Err(DagError::InvalidResponse(
            "no proof derives the source address".into(),
        ));
    }
    Ok(())
}
