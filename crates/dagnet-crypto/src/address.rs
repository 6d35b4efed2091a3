//! Address derivation.
//!
//! An address is derived from a secp256k1 public key as:
//! SHA-256 over the SPKI DER encoding of the uncompressed point, base58
//! encode the digest, keep the last 36 characters, then prepend `DAG` and
//! a check digit (the sum of the tail's decimal digits, mod 9).

use libsecp256k1::PublicKey;
use sha2::{Digest, Sha256};

use dagnet_core::constants::{ADDRESS_PREFIX, ADDRESS_TAIL_LEN};
use dagnet_core::types::Address;

/// SPKI header for an uncompressed secp256k1 public key. The 65-byte point
/// (`04 || X || Y`) follows directly.
const SPKI_PREFIX_HEX: &str = "3056301006072a8648ce3d020106052b8104000a034200";

/// SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// The SPKI DER encoding of an uncompressed public key.
pub fn public_key_der(public_key: &PublicKey) -> Vec<u8> {
    let mut der = hex::decode(SPKI_PREFIX_HEX).expect("prefix hex is well-formed");
    der.extend_from_slice(&public_key.serialize());
    der
}

/// Derive the network address for a public key.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let digest = sha256(&public_key_der(public_key));
    let encoded = bs58::encode(digest).into_string();
    let tail = &encoded[encoded.len() - ADDRESS_TAIL_LEN..];
    let digit_sum: u32 = tail.chars().filter_map(|c| c.to_digit(10)).sum();
    let check_digit = digit_sum % 9;
    format!("{ADDRESS_PREFIX}{check_digit}{tail}")
        .parse()
        .expect("derived addresses are well-formed by construction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagnet_core::constants::ADDRESS_LEN;
    use dagnet_core::validation::validate_address_str;
    use libsecp256k1::SecretKey;

    fn generator_public_key() -> PublicKey {
        // Secret 0x…01 is the smallest non-zero scalar; its public key is G.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        PublicKey::from_secret_key(&SecretKey::parse(&secret).unwrap())
    }

    #[test]
    fn derived_address_is_valid() {
        let addr = address_from_public_key(&generator_public_key());
        assert!(addr.as_str().starts_with(ADDRESS_PREFIX));
        assert_eq!(addr.as_str().len(), ADDRESS_LEN);
        assert!(validate_address_str(addr.as_str(), "address").is_ok());
    }

    #[test]
    fn derivation_is_deterministic() {
        let pk = generator_public_key();
        assert_eq!(address_from_public_key(&pk), address_from_public_key(&pk));
    }

    #[test]
    fn spki_der_is_88_bytes() {
        // 23-byte SPKI header + 65-byte uncompressed point.
        assert_eq!(public_key_der(&generator_public_key()).len(), 88);
    }

    #[test]
    fn distinct_keys_give_distinct_addresses() {
        let a = address_from_public_key(&generator_public_key());
        let mut secret = [0u8; 32];
        secret[31] = 2;
        let b = address_from_public_key(&PublicKey::from_secret_key(
            &SecretKey::parse(&secret).unwrap(),
        ));
        assert_ne!(a, b);
    }
}
