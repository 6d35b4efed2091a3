//! Transaction construction.
//!
//! [`TransactionFactory`] is the single entry point for building all
//! outbound envelopes: native and metagraph token transfers, metagraph
//! data submissions, and chained batches. It is stateless, performs no
//! network I/O, and validates every input before constructing; on the
//! first failure it returns the offending field and builds nothing.
//!
//! Signing is a separate step (`dagnet_crypto::Account::sign_transaction`);
//! every envelope leaves here unsigned.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::Rng;

use dagnet_core::constants::MAX_AMOUNT;
use dagnet_core::envelope::{DataValue, Transaction, TransactionValue, TransferValue};
use dagnet_core::error::DagError;
use dagnet_core::types::{Address, TransactionRef};
use dagnet_core::validation::{
    validate_address, validate_amount, validate_data_payload, validate_salt, validate_timestamp,
    validate_transfer_amount,
};

pub mod request;

pub use request::{DataSubmission, TokenTransfer, TransferStep};

// ── Factory ──────────────────────────────────────────────────────────────────

/// Stateless builder for the four transaction shapes.
pub struct TransactionFactory;

impl TransactionFactory {
    /// Build a token transfer (native, or metagraph when a metagraph id is
    /// set on the request). Zero amounts are rejected; self-transfer is
    /// structurally permitted.
    pub fn token_transfer(request: TokenTransfer) -> Result<Transaction, DagError> {
        validate_address(&request.source, "source")?;
        validate_address(&request.destination, "destination")?;
        if let Some(metagraph_id) = &request.metagraph_id {
            validate_address(metagraph_id, "metagraph_id")?;
        }
        validate_transfer_amount(request.amount)?;
        validate_amount(request.fee, "fee")?;
        let salt = resolve_salt(request.salt)?;

        Ok(Transaction::unsigned(TransactionValue::Transfer(
            TransferValue {
                source: request.source,
                destination: request.destination,
                amount: request.amount,
                fee: request.fee,
                salt,
                parent: request.parent,
                metagraph_id: request.metagraph_id,
            },
        )))
    }

    /// Build a metagraph data submission. The metagraph id is mandatory;
    /// the destination defaults to the source address and the timestamp to
    /// the current wall clock in milliseconds.
    pub fn data_submission(request: DataSubmission) -> Result<Transaction, DagError> {
        validate_address(&request.source, "source")?;
        validate_address(&request.metagraph_id, "metagraph_id")?;
        let destination = request.destination.unwrap_or_else(|| request.source.clone());
        validate_address(&destination, "destination")?;
        validate_data_payload(&request.data)?;
        validate_amount(request.fee, "fee")?;
        let timestamp = request.timestamp.unwrap_or_else(now_ms);
        validate_timestamp(timestamp)?;
        let salt = resolve_salt(request.salt)?;

        Ok(Transaction::unsigned(TransactionValue::Data(DataValue {
            source: request.source,
            destination,
            fee: request.fee,
            salt,
            parent: request.parent,
            metagraph_id: request.metagraph_id,
            data: request.data,
            timestamp,
        })))
    }

    /// Build an ordered list of transfers whose parent references form a
    /// chain: the first references `shared_parent`, each later envelope
    /// references the canonical hash of the previous one at ordinal + 1.
    ///
    /// Each envelope is independently signable, but the chain only remains
    /// valid if the caller submits them in this exact order. Note that the
    /// chain links to hashes of envelopes not yet accepted by the network;
    /// whether a deployment admits such optimistic parents is its policy.
    /// Submit serially with refetched references when in doubt.
    pub fn chained_transfers(
        source: &Address,
        steps: Vec<TransferStep>,
        shared_parent: TransactionRef,
    ) -> Result<Vec<Transaction>, DagError> {
        validate_address(source, "source")?;
        for step in &steps {
            validate_address(&step.destination, "destination")?;
            validate_transfer_amount(step.amount)?;
            validate_amount(step.fee, "fee")?;
        }

        let mut parent = shared_parent;
        let mut chain = Vec::with_capacity(steps.len());
        for step in steps {
            let tx = Self::token_transfer(
                TokenTransfer::new(source.clone(), step.destination, step.amount, parent)
                    .with_fee(step.fee),
            )?;
            parent = TransactionRef::new(
                dagnet_crypto::canonical_hash(&tx.value),
                parent.ordinal + 1,
            );
            chain.push(tx);
        }
        Ok(chain)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Use the caller's salt or draw one uniformly from `[0, 2⁶³)` using the
/// OS's cryptographically secure source.
fn resolve_salt(salt: Option<u64>) -> Result<u64, DagError> {
    match salt {
        Some(value) => {
            validate_salt(value)?;
            Ok(value)
        }
        None => Ok(OsRng.gen_range(0..MAX_AMOUNT)),
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
