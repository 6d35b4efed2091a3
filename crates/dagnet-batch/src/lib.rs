//! Batch request engine.
//!
//! Packs independent read operations (and optionally submissions) into one
//! semaphore-gated concurrent execution and returns a per-item result set
//! in the caller's order. One item failing never cancels another; the
//! whole batch only fails up front, on malformed input such as duplicate
//! ids.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dagnet_client::DagClient;
use dagnet_core::constants::DEFAULT_BATCH_CONCURRENCY;
use dagnet_core::error::{DagError, ValidationError};

pub mod operation;
pub mod result;

pub use operation::{BatchOperation, BatchRequest};
pub use result::{BatchData, BatchItemResult, BatchReport};

/// Executes batches against one client. Clone-free: share via reference or
/// wrap in `Arc` as needed.
pub struct BatchEngine {
    client: Arc<DagClient>,
    concurrency: usize,
}

impl BatchEngine {
    pub fn new(client: Arc<DagClient>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Cap on operations in flight. Orthogonal to the transport's
    /// connection pool limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run a batch to completion.
    pub async fn execute(&self, requests: Vec<BatchRequest>) -> Result<BatchReport, DagError> {
        self.execute_with_cancel(requests, CancellationToken::new())
            .await
    }

    /// Blocking wrapper over [`BatchEngine::execute`], driven by the SDK's
    /// private runtime.
    pub fn execute_blocking(&self, requests: Vec<BatchRequest>) -> Result<BatchReport, DagError> {
        dagnet_client::blocking::block_on(self.execute(requests))
    }

    /// Run a batch with cooperative cancellation: operations not yet
    /// started when the token fires report a deadline-style failure;
    /// in-flight ones are allowed to finish. The result set always carries
    /// the state of every id.
    pub async fn execute_with_cancel(
        &self,
        requests: Vec<BatchRequest>,
        cancel: CancellationToken,
    ) -> Result<BatchReport, DagError> {
        let started_at_ms = Utc::now().timestamp_millis();
        let started = Instant::now();

        // Duplicate ids would make the result set ambiguous: whole-batch error.
        let mut seen = HashSet::new();
        for request in &requests {
            if !seen.insert(request.id.as_str()) {
                return Err(ValidationError::new(
                    "id",
                    format!("duplicate batch id {:?}", request.id),
                )
                .into());
            }
        }

        if requests.is_empty() {
            return Ok(BatchReport {
                results: Vec::new(),
                started_at_ms,
                finished_at_ms: started_at_ms,
                execution_time_ms: 0,
                concurrent_execution: false,
            });
        }

        let concurrent_execution = self.concurrency > 1 && requests.len() > 1;
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(requests.len());

        for (index, request) in requests.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let BatchRequest { id, op } = request;
                let item_started = Instant::now();

                // Parameter validation happens before any network dispatch.
                if let Err(err) = op.validate() {
                    return (index, BatchItemResult::failed(id, err.into(), 0));
                }

                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore is never closed");

                if cancel.is_cancelled() {
                    let elapsed = item_started.elapsed().as_millis() as u64;
                    return (
                        index,
                        BatchItemResult::failed(
                            id,
                            DagError::Timeout {
                                elapsed_ms: elapsed,
                            },
                            elapsed,
                        ),
                    );
                }

                let outcome = op.dispatch(&client).await;
                let elapsed = item_started.elapsed().as_millis() as u64;
                if let Err(err) = &outcome {
                    warn!(id = %id, error = %err, "batch item failed");
                }
                (index, BatchItemResult::new(id, outcome, elapsed))
            }));
        }

        let mut slots: Vec<Option<BatchItemResult>> = Vec::new();
        slots.resize_with(handles.len(), || None);
        for handle in handles {
            match handle.await {
                Ok((index, result)) => slots[index] = Some(result),
                Err(join_error) => {
                    // A panicked task loses its id; this indicates an SDK
                    // bug rather than a network condition.
                    warn!(error = %join_error, "batch task aborted");
                }
            }
        }
        let results: Vec<BatchItemResult> = slots.into_iter().flatten().collect();

        let execution_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            total = results.len(),
            successes = results.iter().filter(|r| r.success()).count(),
            execution_time_ms,
            "batch finished"
        );

        Ok(BatchReport {
            results,
            started_at_ms,
            finished_at_ms: Utc::now().timestamp_millis(),
            execution_time_ms,
            concurrent_execution,
        })
    }
}
