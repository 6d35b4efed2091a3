use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::validation::validate_address_str;

/// Amount in the network's smallest unit (10⁻⁸ DAG). Valid range `[0, 2⁶³)`.
pub type Amount = u64;

/// Per-source transaction index. Strictly increasing per address.
pub type Ordinal = u64;

// ── Address ──────────────────────────────────────────────────────────────────

/// A network address: `DAG` + check digit + 36 base58 characters (40 total).
///
/// Construction always validates; an `Address` in hand is syntactically
/// well-formed with a correct check digit. Equality is case-sensitive
/// exact-match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The 36-character base58 tail after prefix and check digit.
    pub fn tail(&self) -> &str {
        &self.0[4..]
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_address_str(s, "address")?;
        Ok(Address(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_address_str(&s, "address")?;
        Ok(Address(s))
    }
}

impl TryFrom<&str> for Address {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::try_from(s).map_err(serde::de::Error::custom)
    }
}

// ── TxHash ───────────────────────────────────────────────────────────────────

/// 32-byte transaction hash. Hex-encoded (64 chars) on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The all-zero hash used by genesis parent references.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        if s.len() != 64 {
            return Err(ValidationError::new(
                "hash",
                format!("expected 64 hex chars, got {}", s.len()),
            ));
        }
        let bytes = hex::decode(s)
            .map_err(|e| ValidationError::new("hash", format!("invalid hex: {e}")))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({}…)", &self.to_hex()[..16])
    }
}

impl Serialize for TxHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TxHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ── TransactionRef ───────────────────────────────────────────────────────────

/// Reference to the previous transaction in a source-specific chain.
///
/// The first transaction from any address uses the canonical genesis
/// reference: all-zero hash, ordinal 0.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransactionRef {
    pub hash: TxHash,
    pub ordinal: Ordinal,
}

impl TransactionRef {
    pub fn new(hash: TxHash, ordinal: Ordinal) -> Self {
        Self { hash, ordinal }
    }

    /// The canonical genesis reference.
    pub fn genesis() -> Self {
        Self {
            hash: TxHash::zero(),
            ordinal: 0,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.hash.is_zero() && self.ordinal == 0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.hash, self.ordinal)
    }
}
