//! The network read API plus transaction submission.
//!
//! All operations here are thin, typed calls over the [`Transport`] seam;
//! chaining, batching and simulation live in their own crates.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use dagnet_core::constants::DEFAULT_TIMEOUT_SECS;
use dagnet_core::envelope::Transaction;
use dagnet_core::error::DagError;
use dagnet_core::types::{Address, Ordinal, TxHash};
use dagnet_core::validation::{validate_address_str, validate_envelope_structure};

use crate::deployment::Deployment;
use crate::rest::{
    BalanceInfo, BalanceResponse, ClusterPeer, NodeInfo, RecordList, RejectionBody,
    SnapshotInfo, SubmitResponse, TransactionRecord,
};
use crate::transport::{HttpRequest, ReqwestTransport, RetryingTransport, Transport};

/// Client for one deployment. Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct DagClient {
    deployment: Deployment,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl DagClient {
    /// Connect to a deployment with the default pooled transport and
    /// retry policy.
    pub fn new(deployment: Deployment) -> Result<Self, DagError> {
        Ok(Self::with_transport(
            deployment,
            Arc::new(RetryingTransport::new(ReqwestTransport::new()?)),
        ))
    }

    /// Use a caller-supplied transport (tests, instrumentation, custom TLS).
    pub fn with_transport(deployment: Deployment, transport: Arc<dyn Transport>) -> Self {
        Self {
            deployment,
            transport,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the per-request timeout for every call made by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Balance and last-accepted reference for an address. Addresses with
    /// no history report zero with the genesis reference.
    pub async fn balance(&self, address: &Address) -> Result<BalanceInfo, DagError> {
        let url = self
            .deployment
            .l1(&format!("/addresses/{address}/balance"));
        match self.get_json::<BalanceResponse>(&url).await {
            Ok(raw) => Ok(raw.into()),
            Err(DagError::Http { status: 404, .. }) => {
                debug!(%address, "no balance history; reporting genesis state");
                Ok(BalanceInfo::empty())
            }
            Err(err) => Err(err),
        }
    }

    /// The current ordinal for an address (0 when it has no history).
    pub async fn ordinal(&self, address: &Address) -> Result<Ordinal, DagError> {
        Ok(self.balance(address).await?.ordinal)
    }

    /// Recent transactions involving `address`, newest first.
    pub async fn transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, DagError> {
        let url = self
            .deployment
            .be(&format!("/addresses/{address}/transactions?limit={limit}"));
        Ok(self
            .get_json::<RecordList<TransactionRecord>>(&url)
            .await?
            .into_vec())
    }

    /// Recent transactions across the whole network, newest first.
    pub async fn recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, DagError> {
        let url = self.deployment.be(&format!("/transactions?limit={limit}"));
        Ok(self
            .get_json::<RecordList<TransactionRecord>>(&url)
            .await?
            .into_vec())
    }

    /// Identity, version and state of the L0 node answering for this
    /// deployment.
    pub async fn node_info(&self) -> Result<NodeInfo, DagError> {
        self.get_json(&self.deployment.l0("/node/info")).await
    }

    /// Peers of the L0 cluster with their states.
    pub async fn cluster_info(&self) -> Result<Vec<ClusterPeer>, DagError> {
        Ok(self
            .get_json::<RecordList<ClusterPeer>>(&self.deployment.l0("/cluster/info"))
            .await?
            .into_vec())
    }

    /// The latest global snapshot (polling-mode block tip source).
    pub async fn latest_snapshot(&self) -> Result<SnapshotInfo, DagError> {
        let url = self.deployment.l0("/global-snapshots/latest/combined");
        let value: serde_json::Value = self.get_json(&url).await?;
        SnapshotInfo::from_value(&value)
            .ok_or_else(|| DagError::InvalidResponse("snapshot has no ordinal".into()))
    }

    /// Local, purely syntactic address check. Never touches the network.
    pub fn validate_address(&self, address: &str) -> bool {
        validate_address_str(address, "address").is_ok()
    }

    // ── Submission ───────────────────────────────────────────────────────────

    /// Submit a signed envelope to L1. Returns the accepted hash, or
    /// `Rejected` when the node answers a 4xx with a structured reason.
    pub async fn submit_transaction(&self, tx: &Transaction) -> Result<TxHash, DagError> {
        validate_envelope_structure(tx)?;
        let body = serde_json::to_vec(tx)
            .map_err(|e| DagError::InvalidResponse(format!("encoding envelope: {e}")))?;
        let url = self.deployment.l1("/transactions");
        let request = HttpRequest::post_json(url, body).with_timeout(self.timeout);

        match self.transport.request(request).await {
            Ok(response) => {
                let accepted: SubmitResponse = response.json()?;
                debug!(hash = %accepted.hash, "transaction accepted");
                Ok(accepted.hash)
            }
            Err(DagError::Http { status, body }) if (400..500).contains(&status) => {
                match serde_json::from_str::<RejectionBody>(&body) {
                    Ok(rejection) => Err(DagError::Rejected {
                        code: rejection.error.code,
                        message: rejection.error.message,
                    }),
                    Err(_) => Err(DagError::Http { status, body }),
                }
            }
            Err(err) => Err(err),
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DagError> {
        let request = HttpRequest::get(url).with_timeout(self.timeout);
        self.transport.request(request).await?.json()
    }
}
