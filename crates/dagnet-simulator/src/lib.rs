//! Pre-flight simulation.
//!
//! The simulator validates an envelope offline and, when a client handle
//! is supplied, checks balance sufficiency and parent-reference freshness
//! against the network. It never signs, submits, or mutates its inputs.
//! Balance lookups go through a small TTL cache keyed by
//! `(deployment, source)` so batch simulations do not refetch.

pub mod cache;
pub mod report;

use tracing::{debug, warn};

use dagnet_client::DagClient;
use dagnet_core::envelope::{Proof, Transaction, TransactionValue};
use dagnet_core::error::{DagError, ValidationError};
use dagnet_core::validation::{
    validate_address, validate_amount, validate_data_payload, validate_envelope_structure,
    validate_salt, validate_timestamp, validate_transfer_amount,
};

use crate::cache::BalanceCache;
pub use crate::report::{Confidence, SimulationReport};

/// The pre-flight engine. Cheap to construct; share one per deployment to
/// benefit from its cache.
pub struct Simulator {
    cache: BalanceCache,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            cache: BalanceCache::with_defaults(),
        }
    }

    /// Structural and environmental checks without the size estimate.
    pub async fn simulate(
        &self,
        tx: &Transaction,
        client: Option<&DagClient>,
    ) -> SimulationReport {
        self.run(tx, client, false).await
    }

    /// Full analysis including the estimated wire size of the signed
    /// envelope.
    pub async fn simulate_detailed(
        &self,
        tx: &Transaction,
        client: Option<&DagClient>,
    ) -> SimulationReport {
        self.run(tx, client, true).await
    }

    /// Blocking wrapper over [`Simulator::simulate`], driven by the SDK's
    /// private runtime.
    pub fn simulate_blocking(
        &self,
        tx: &Transaction,
        client: Option<&DagClient>,
    ) -> SimulationReport {
        dagnet_client::blocking::block_on(self.simulate(tx, client))
    }

    async fn run(
        &self,
        tx: &Transaction,
        client: Option<&DagClient>,
        detailed: bool,
    ) -> SimulationReport {
        let validation_errors = collect_validation_errors(tx);
        let canonical_hash = detailed.then(|| dagnet_crypto::canonical_hash(&tx.value));
        let estimated_size_bytes = detailed.then(|| estimate_signed_size(tx));

        let mut environmental_errors: Vec<DagError> = Vec::new();
        let mut balance_before = None;
        let mut balance_after = None;
        let mut parent_reference_fresh = None;
        let mut online_checks_ran = false;

        if let Some(client) = client {
            match self.cache.balance(client, tx.value.source()).await {
                Ok(info) => {
                    online_checks_ran = true;
                    let amount = tx.value.amount().unwrap_or(0);
                    let fee = tx.value.fee();
                    let need = amount as u128 + fee as u128;
                    let after = info.balance as i128 - need as i128;
                    balance_before = Some(info.balance);
                    balance_after = Some(after);
                    if after < 0 {
                        environmental_errors.push(DagError::InsufficientBalance {
                            need,
                            have: info.balance as u128,
                        });
                    }

                    let got = tx.value.parent().ordinal;
                    let fresh = got >= info.ordinal;
                    parent_reference_fresh = Some(fresh);
                    if !fresh {
                        environmental_errors.push(DagError::ParentReferenceStale {
                            got,
                            current: info.ordinal,
                        });
                    }
                }
                Err(err) => {
                    // Environment unknown: report nothing rather than guess.
                    warn!(error = %err, "balance lookup failed during simulation");
                }
            }
        }

        let will_succeed = validation_errors.is_empty()
            && environmental_errors.is_empty()
            && balance_after.map_or(true, |after| after >= 0)
            && parent_reference_fresh.unwrap_or(true);

        let confidence = if online_checks_ran && will_succeed {
            Confidence::High
        } else if client.is_none() && validation_errors.is_empty() {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        debug!(
            will_succeed,
            ?confidence,
            validation = validation_errors.len(),
            environmental = environmental_errors.len(),
            "simulation finished"
        );

        SimulationReport {
            will_succeed,
            validation_errors,
            environmental_errors,
            canonical_hash,
            estimated_size_bytes,
            balance_before,
            balance_after,
            parent_reference_fresh,
            confidence,
        }
    }
}

// ── Structural pass ──────────────────────────────────────────────────────────

/// Run every C-level validator, accumulating failures instead of stopping
/// at the first.
fn collect_validation_errors(tx: &Transaction) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let value = &tx.value;

    push_err(&mut errors, validate_address(value.source(), "source"));
    push_err(&mut errors, validate_address(value.destination(), "destination"));
    if let Some(metagraph_id) = value.metagraph_id() {
        push_err(&mut errors, validate_address(metagraph_id, "metagraph_id"));
    }
    push_err(&mut errors, validate_amount(value.fee(), "fee"));
    push_err(&mut errors, validate_salt(value.salt()));
    match value {
        TransactionValue::Transfer(t) => {
            push_err(&mut errors, validate_transfer_amount(t.amount));
        }
        TransactionValue::Data(d) => {
            push_err(&mut errors, validate_data_payload(&d.data));
            push_err(&mut errors, validate_timestamp(d.timestamp));
        }
    }
    // Proof structure only applies once the envelope claims to be signed.
    if tx.is_signed() {
        push_err(&mut errors, validate_envelope_structure(tx));
    }
    errors
}

fn push_err(errors: &mut Vec<ValidationError>, result: Result<(), ValidationError>) {
    if let Err(err) = result {
        if !errors.contains(&err) {
            errors.push(err);
        }
    }
}

// ── Size estimate ────────────────────────────────────────────────────────────

/// Length of the canonical wire serialization after signing. Unsigned
/// envelopes get one placeholder proof with a 72-byte DER signature.
fn estimate_signed_size(tx: &Transaction) -> usize {
    if tx.is_signed() {
        return serde_json::to_string(tx).map(|s| s.len()).unwrap_or(0);
    }
    let mut placeholder = tx.clone();
    placeholder.proofs.push(Proof {
        id: "0".repeat(128),
        signature: "0".repeat(dagnet_core::constants::DER_SIGNATURE_PLACEHOLDER_LEN * 2),
    });
    serde_json::to_string(&placeholder)
        .map(|s| s.len())
        .unwrap_or(0)
}
