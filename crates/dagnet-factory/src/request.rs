//! Factory request types.
//!
//! Constructors take the required fields; optional ones (fee, salt,
//! metagraph id, timestamp) are layered on with `with_*` methods so that
//! defaults stay in one place.

use serde_json::Value;

use dagnet_core::types::{Address, Amount, TransactionRef};

/// Inputs for a token transfer.
#[derive(Clone, Debug)]
pub struct TokenTransfer {
    pub source: Address,
    pub destination: Address,
    pub amount: Amount,
    pub parent: TransactionRef,
    pub fee: Amount,
    /// Caller-chosen salt; drawn randomly when absent.
    pub salt: Option<u64>,
    /// Set for metagraph token transfers.
    pub metagraph_id: Option<Address>,
}

impl TokenTransfer {
    pub fn new(
        source: Address,
        destination: Address,
        amount: Amount,
        parent: TransactionRef,
    ) -> Self {
        Self {
            source,
            destination,
            amount,
            parent,
            fee: 0,
            salt: None,
            metagraph_id: None,
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_salt(mut self, salt: u64) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn with_metagraph(mut self, metagraph_id: Address) -> Self {
        self.metagraph_id = Some(metagraph_id);
        self
    }
}

/// Inputs for a metagraph data submission.
#[derive(Clone, Debug)]
pub struct DataSubmission {
    pub source: Address,
    pub metagraph_id: Address,
    pub data: Value,
    pub parent: TransactionRef,
    /// Defaults to `source` when absent.
    pub destination: Option<Address>,
    /// Milliseconds since the Unix epoch; defaults to now.
    pub timestamp: Option<i64>,
    pub fee: Amount,
    pub salt: Option<u64>,
}

impl DataSubmission {
    pub fn new(source: Address, metagraph_id: Address, data: Value, parent: TransactionRef) -> Self {
        Self {
            source,
            metagraph_id,
            data,
            parent,
            destination: None,
            timestamp: None,
            fee: 0,
            salt: None,
        }
    }

    pub fn with_destination(mut self, destination: Address) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_salt(mut self, salt: u64) -> Self {
        self.salt = Some(salt);
        self
    }
}

/// One hop of a chained batch build.
#[derive(Clone, Debug)]
pub struct TransferStep {
    pub destination: Address,
    pub amount: Amount,
    pub fee: Amount,
}

impl TransferStep {
    pub fn new(destination: Address, amount: Amount) -> Self {
        Self {
            destination,
            amount,
            fee: 0,
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }
}
