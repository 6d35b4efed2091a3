//! Batch operations: the closed set of dispatchable calls.

use dagnet_client::DagClient;
use dagnet_core::envelope::Transaction;
use dagnet_core::error::{DagError, ValidationError};
use dagnet_core::types::Address;
use dagnet_core::validation::{validate_address, validate_envelope_structure};

use crate::result::BatchData;

/// One operation of a batch, tagged by what it does. Each variant carries
/// exactly the parameters that operation needs.
#[derive(Clone, Debug)]
pub enum BatchOperation {
    Balance { address: Address },
    Ordinal { address: Address },
    Transactions { address: Address, limit: usize },
    RecentTransactions { limit: usize },
    NodeInfo,
    ClusterInfo,
    SubmitTransaction { transaction: Box<Transaction> },
}

impl BatchOperation {
    /// Stable operation tag, mirrored in logs and result inspection.
    pub fn tag(&self) -> &'static str {
        match self {
            BatchOperation::Balance { .. } => "balance",
            BatchOperation::Ordinal { .. } => "ordinal",
            BatchOperation::Transactions { .. } => "transactions",
            BatchOperation::RecentTransactions { .. } => "recent_transactions",
            BatchOperation::NodeInfo => "node_info",
            BatchOperation::ClusterInfo => "cluster_info",
            BatchOperation::SubmitTransaction { .. } => "submit_transaction",
        }
    }

    /// Parameter validation, run before any dispatch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BatchOperation::Balance { address } | BatchOperation::Ordinal { address } => {
                validate_address(address, "address")
            }
            BatchOperation::Transactions { address, limit } => {
                validate_address(address, "address")?;
                validate_limit(*limit)
            }
            BatchOperation::RecentTransactions { limit } => validate_limit(*limit),
            BatchOperation::NodeInfo | BatchOperation::ClusterInfo => Ok(()),
            BatchOperation::SubmitTransaction { transaction } => {
                validate_envelope_structure(transaction)
            }
        }
    }

    /// Execute against the read API.
    pub(crate) async fn dispatch(&self, client: &DagClient) -> Result<BatchData, DagError> {
        match self {
            BatchOperation::Balance { address } => {
                client.balance(address).await.map(BatchData::Balance)
            }
            BatchOperation::Ordinal { address } => {
                client.ordinal(address).await.map(BatchData::Ordinal)
            }
            BatchOperation::Transactions { address, limit } => client
                .transactions(address, *limit)
                .await
                .map(BatchData::Transactions),
            BatchOperation::RecentTransactions { limit } => client
                .recent_transactions(*limit)
                .await
                .map(BatchData::Transactions),
            BatchOperation::NodeInfo => client.node_info().await.map(BatchData::NodeInfo),
            BatchOperation::ClusterInfo => {
                client.cluster_info().await.map(BatchData::ClusterInfo)
            }
            BatchOperation::SubmitTransaction { transaction } => client
                .submit_transaction(transaction)
                .await
                .map(BatchData::SubmitHash),
        }
    }
}

fn validate_limit(limit: usize) -> Result<(), ValidationError> {
    if limit == 0 {
        return Err(ValidationError::new("limit", "must be at least 1"));
    }
    Ok(())
}

/// One entry of a batch: a caller-chosen id (unique within the batch) and
/// the operation to run.
#[derive(Clone, Debug)]
pub struct BatchRequest {
    pub id: String,
    pub op: BatchOperation,
}

impl BatchRequest {
    pub fn new(id: impl Into<String>, op: BatchOperation) -> Self {
        Self { id: id.into(), op }
    }
}
