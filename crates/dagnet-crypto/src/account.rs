//! Accounts: a secp256k1 key pair plus the derived network address.
//!
//! The secret scalar never leaves this type except through
//! [`Account::secret_key_hex`], which hands back a self-wiping buffer.
//! Nothing here persists keys to disk.

use libsecp256k1::{Message, PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use dagnet_core::envelope::{Proof, Transaction};
use dagnet_core::error::DagError;
use dagnet_core::types::Address;

use crate::address::{address_from_public_key, sha256};
use crate::codec::{canonical_hash, der_encode_signature, proof_id};

/// A signing identity: secret scalar, public key, derived address.
pub struct Account {
    secret: SecretKey,
    public: PublicKey,
    address: Address,
}

impl Account {
    /// Draw a fresh account from OS randomness.
    ///
    /// `SecretKey::random` rejects zero and out-of-range scalars internally,
    /// so the result is always a valid curve scalar.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        Self::from_secret(secret)
    }

    /// Import a 64-hex-character secret. Rejects wrong lengths, non-hex,
    /// zero, and scalars at or above the curve order.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, DagError> {
        if secret_hex.len() != 64 {
            return Err(DagError::InvalidKey(format!(
                "secret must be 64 hex chars, got {}",
                secret_hex.len()
            )));
        }
        let bytes = Zeroizing::new(
            hex::decode(secret_hex)
                .map_err(|e| DagError::InvalidKey(format!("secret is not hex: {e}")))?,
        );
        let secret = SecretKey::parse_slice(&bytes)
            .map_err(|e| DagError::InvalidKey(format!("secret is not a valid scalar: {e:?}")))?;
        Ok(Self::from_secret(secret))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key(&secret);
        let address = address_from_public_key(&public);
        Self {
            secret,
            public,
            address,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Uncompressed public key without the leading `04` byte: 128 hex chars.
    pub fn public_key_hex(&self) -> String {
        proof_id(&self.public)
    }

    /// Export the secret as hex in a buffer that wipes itself on drop.
    pub fn secret_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret.serialize()))
    }

    /// Sign arbitrary bytes: SHA-256 digest, then deterministic ECDSA
    /// (RFC 6979). Returns the low-S DER signature as hex.
    pub fn sign(&self, message: &[u8]) -> Result<String, DagError> {
        let digest = Message::parse(&sha256(message));
        let (signature, _recovery) = libsecp256k1::sign(&digest, &self.secret);
        Ok(hex::encode(der_encode_signature(&signature)))
    }

    /// Sign an envelope: hash `value` canonically, sign the hash, and append
    /// a proof. The input is untouched; a new envelope is returned.
    pub fn sign_transaction(&self, tx: &Transaction) -> Result<Transaction, DagError> {
        let hash = canonical_hash(&tx.value);
        let signature = self.sign(hash.as_bytes())?;
        let mut signed = tx.clone();
        signed.proofs.push(Proof {
            id: self.public_key_hex(),
            signature,
        });
        Ok(signed)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Account({})", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{public_key_from_proof_id, verify_signature, verify_transaction};
    use dagnet_core::envelope::{TransactionValue, TransferValue};
    use dagnet_core::types::TransactionRef;

    const SMALLEST_SCALAR: &str =
        "0000000000000000000000000000000000000000000000000000000000000001";

    fn transfer_from(account: &Account) -> Transaction {
        Transaction::unsigned(TransactionValue::Transfer(TransferValue {
            source: account.address().clone(),
            destination: "DAG4abcdefghijkmnopqrstuvwxyzABCDEFGHJK4".parse().unwrap(),
            amount: 100_000_000,
            fee: 0,
            salt: 42,
            parent: TransactionRef::genesis(),
            metagraph_id: None,
        }))
    }

    #[test]
    fn generated_account_has_valid_address() {
        let account = Account::generate();
        assert!(account.address().as_str().starts_with("DAG"));
        assert_eq!(account.address().as_str().len(), 40);
        assert_eq!(account.public_key_hex().len(), 128);
    }

    #[test]
    fn smallest_scalar_derives_the_generator() {
        let account = Account::from_secret_hex(SMALLEST_SCALAR).unwrap();
        // G's x-coordinate leads the uncompressed encoding.
        assert!(account
            .public_key_hex()
            .starts_with("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"));
        assert!(account.address().as_str().starts_with("DAG"));
        assert_eq!(account.address().as_str().len(), 40);
    }

    #[test]
    fn import_matches_export() {
        let account = Account::generate();
        let reimported = Account::from_secret_hex(&account.secret_key_hex()).unwrap();
        assert_eq!(account.address(), reimported.address());
        // RFC 6979 signing is deterministic, so both sign identically.
        assert_eq!(
            account.sign(b"dagnet").unwrap(),
            reimported.sign(b"dagnet").unwrap()
        );
    }

    #[test]
    fn rejects_bad_secrets() {
        assert!(Account::from_secret_hex("deadbeef").is_err());
        assert!(Account::from_secret_hex(&"00".repeat(32)).is_err());
        assert!(Account::from_secret_hex(&"zz".repeat(32)).is_err());
        // The curve order n itself is out of range.
        assert!(Account::from_secret_hex(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
        )
        .is_err());
    }

    #[test]
    fn sign_transaction_is_pure_and_verifiable() {
        let account = Account::from_secret_hex(SMALLEST_SCALAR).unwrap();
        let unsigned = transfer_from(&account);
        let before = unsigned.clone();

        let signed = account.sign_transaction(&unsigned).unwrap();
        assert_eq!(unsigned, before, "input envelope must not be mutated");
        assert_eq!(signed.proofs.len(), 1);
        assert_eq!(signed.proofs[0].id, account.public_key_hex());
        verify_transaction(&signed).unwrap();
    }

    #[test]
    fn signature_is_low_s_der() {
        let account = Account::generate();
        let tx = account.sign_transaction(&transfer_from(&account)).unwrap();
        let der = hex::decode(&tx.proofs[0].signature).unwrap();
        let signature = libsecp256k1::Signature::parse_der(&der).unwrap();
        assert!(!signature.s.is_high());
    }

    #[test]
    fn tampered_canonical_bytes_fail_verification() {
        let account = Account::generate();
        let signed = account.sign_transaction(&transfer_from(&account)).unwrap();
        let public_key = public_key_from_proof_id(&signed.proofs[0].id).unwrap();

        let hash = canonical_hash(&signed.value);
        verify_signature(&public_key, hash.as_bytes(), &signed.proofs[0].signature).unwrap();

        // Flip one byte of the hashed message.
        let mut tampered = *hash.as_bytes();
        tampered[0] ^= 0x01;
        assert!(
            verify_signature(&public_key, &tampered, &signed.proofs[0].signature).is_err()
        );
    }

    #[test]
    fn foreign_proof_does_not_prove_source() {
        let account = Account::generate();
        let stranger = Account::generate();
        let tx = transfer_from(&account);
        let signed_by_stranger = stranger.sign_transaction(&tx).unwrap();
        assert!(verify_transaction(&signed_by_stranger).is_err());
    }
}
