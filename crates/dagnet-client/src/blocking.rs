//! Synchronous wrappers.
//!
//! The async surface is primary; these wrappers block on a private tokio
//! runtime so no logic is duplicated. Do not call them from inside another
//! tokio runtime; use the async client there instead.

use std::future::Future;

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

use dagnet_core::envelope::Transaction;
use dagnet_core::error::DagError;
use dagnet_core::types::{Address, Ordinal, TxHash};

use crate::deployment::Deployment;
use crate::rest::{BalanceInfo, ClusterPeer, NodeInfo, SnapshotInfo, TransactionRecord};

static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("dagnet-blocking")
        .enable_all()
        .build()
        .expect("building the blocking runtime is infallible")
});

/// Run a future on the SDK's private scheduler and block for the result.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

/// Blocking facade over [`crate::DagClient`].
#[derive(Clone)]
pub struct DagClient {
    inner: crate::DagClient,
}

impl DagClient {
    pub fn new(deployment: Deployment) -> Result<Self, DagError> {
        Ok(Self {
            inner: crate::DagClient::new(deployment)?,
        })
    }

    pub fn from_async(inner: crate::DagClient) -> Self {
        Self { inner }
    }

    pub fn balance(&self, address: &Address) -> Result<BalanceInfo, DagError> {
        block_on(self.inner.balance(address))
    }

    pub fn ordinal(&self, address: &Address) -> Result<Ordinal, DagError> {
        block_on(self.inner.ordinal(address))
    }

    pub fn transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, DagError> {
        block_on(self.inner.transactions(address, limit))
    }

    pub fn recent_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>, DagError> {
        block_on(self.inner.recent_transactions(limit))
    }

    pub fn node_info(&self) -> Result<NodeInfo, DagError> {
        block_on(self.inner.node_info())
    }

    pub fn cluster_info(&self) -> Result<Vec<ClusterPeer>, DagError> {
        block_on(self.inner.cluster_info())
    }

    pub fn latest_snapshot(&self) -> Result<SnapshotInfo, DagError> {
        block_on(self.inner.latest_snapshot())
    }

    pub fn validate_address(&self, address: &str) -> bool {
        self.inner.validate_address(address)
    }

    pub fn submit_transaction(&self, tx: &Transaction) -> Result<TxHash, DagError> {
        block_on(self.inner.submit_transaction(tx))
    }
}
