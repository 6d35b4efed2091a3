//! HTTP client layer: deployments, the pluggable transport, the network
//! read API, transaction submission, and blocking wrappers.

pub mod blocking;
pub mod client;
pub mod deployment;
pub mod rest;
pub mod transport;

pub use client::DagClient;
pub use deployment::Deployment;
pub use rest::{BalanceInfo, ClusterPeer, NodeInfo, SnapshotInfo, TransactionRecord};
pub use transport::{
    HttpRequest, HttpResponse, Method, ReqwestTransport, RetryPolicy, RetryingTransport, Transport,
};
