//! Online simulation scenarios against an in-memory transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use dagnet_client::{DagClient, Deployment, HttpRequest, HttpResponse, Transport};
use dagnet_core::error::DagError;
use dagnet_core::types::{TransactionRef, TxHash};
use dagnet_crypto::Account;
use dagnet_factory::{TokenTransfer, TransactionFactory};
use dagnet_simulator::{Confidence, Simulator};

/// Serves one fixed balance body for every balance lookup and counts them.
struct BalanceTransport {
    body: String,
    balance_calls: AtomicUsize,
}

impl BalanceTransport {
    fn new(balance: u64, ordinal: u64) -> Self {
        Self {
            body: format!("{{\"balance\":{balance},\"ordinal\":{ordinal}}}"),
            balance_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transport for BalanceTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, DagError> {
        assert!(request.url.contains("/balance"), "unexpected call: {}", request.url);
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::new(200, self.body.clone().into_bytes()))
    }
}

fn client_over(transport: Arc<BalanceTransport>) -> DagClient {
    DagClient::with_transport(Deployment::test(), transport)
}

fn transfer(account: &Account, amount: u64, parent: TransactionRef) -> dagnet_core::Transaction {
    TransactionFactory::token_transfer(TokenTransfer::new(
        account.address().clone(),
        Account::generate().address().clone(),
        amount,
        parent,
    ))
    .unwrap()
}

#[tokio::test]
async fn detects_insufficient_balance() {
    let account = Account::generate();
    // Balance 0.5 DAG, fresh parent at the current ordinal.
    let transport = Arc::new(BalanceTransport::new(50_000_000, 3));
    let client = client_over(transport);

    let tx = transfer(&account, 100_000_000, TransactionRef::new(TxHash::zero(), 3));
    let report = Simulator::new().simulate(&tx, Some(&client)).await;

    assert!(!report.will_succeed);
    assert!(report.validation_errors.is_empty());
    assert!(report.has_environmental("insufficient_balance"));
    assert_eq!(report.balance_before, Some(50_000_000));
    assert_eq!(report.balance_after, Some(-50_000_000));
    assert_eq!(report.parent_reference_fresh, Some(true));
    assert_eq!(report.confidence, Confidence::Low);
}

#[tokio::test]
async fn passes_with_funds_and_fresh_parent() {
    let account = Account::generate();
    let transport = Arc::new(BalanceTransport::new(500_000_000, 7));
    let client = client_over(transport);

    let tx = transfer(&account, 100_000_000, TransactionRef::new(TxHash::zero(), 7));
    let report = Simulator::new().simulate(&tx, Some(&client)).await;

    assert!(report.will_succeed);
    assert!(report.environmental_errors.is_empty());
    assert_eq!(report.balance_after, Some(400_000_000));
    assert_eq!(report.confidence, Confidence::High);
}

#[tokio::test]
async fn flags_stale_parent_reference() {
    let account = Account::generate();
    let transport = Arc::new(BalanceTransport::new(500_000_000, 9));
    let client = client_over(transport);

    // Parent ordinal 4 is behind the current ordinal 9.
    let tx = transfer(&account, 1, TransactionRef::new(TxHash::zero(), 4));
    let report = Simulator::new().simulate(&tx, Some(&client)).await;

    assert!(!report.will_succeed);
    assert!(report.has_environmental("parent_reference_stale"));
    assert_eq!(report.parent_reference_fresh, Some(false));
}

#[tokio::test]
async fn cache_collapses_repeat_lookups() {
    let account = Account::generate();
    let transport = Arc::new(BalanceTransport::new(500_000_000, 0));
    let client = client_over(transport.clone());

    let simulator = Simulator::new();
    for _ in 0..5 {
        let tx = transfer(&account, 1, TransactionRef::genesis());
        let _ = simulator.simulate(&tx, Some(&client)).await;
    }
    assert_eq!(transport.balance_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exact_balance_spend_succeeds() {
    let account = Account::generate();
    let transport = Arc::new(BalanceTransport::new(100_000_000, 0));
    let client = client_over(transport);

    let tx = transfer(&account, 100_000_000, TransactionRef::genesis());
    let report = Simulator::new().simulate(&tx, Some(&client)).await;

    assert!(report.will_succeed);
    assert_eq!(report.balance_after, Some(0));
}
