//! Cryptographic layer: secp256k1 accounts, address derivation, the
//! canonical codec, and envelope verification.

pub mod account;
pub mod address;
pub mod codec;

pub use account::Account;
pub use address::{address_from_public_key, public_key_der, sha256};
pub use codec::{
    canonical_hash, der_encode_signature, proof_id, public_key_from_proof_id, sha512_256,
    verify_signature, verify_transaction,
};
