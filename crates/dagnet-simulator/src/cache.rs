//! Time-bounded balance cache.
//!
//! Keyed by `(deployment, source)` so that simulating a batch of envelopes
//! from one account costs a single balance fetch. Entries expire after a
//! short TTL and the least-recently-used entry is evicted when the size
//! bound is hit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use dagnet_client::{BalanceInfo, DagClient};
use dagnet_core::constants::{SIMULATOR_CACHE_MAX_ENTRIES, SIMULATOR_CACHE_TTL_SECS};
use dagnet_core::error::DagError;
use dagnet_core::types::Address;

struct Entry {
    info: BalanceInfo,
    fetched_at: Instant,
    last_used: Instant,
}

pub struct BalanceCache {
    entries: Mutex<HashMap<(String, Address), Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl BalanceCache {
    pub fn with_defaults() -> Self {
        Self::new(
            Duration::from_secs(SIMULATOR_CACHE_TTL_SECS),
            SIMULATOR_CACHE_MAX_ENTRIES,
        )
    }

    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Fetch through the cache. A hit younger than the TTL is served
    /// without touching the network.
    pub async fn balance(
        &self,
        client: &DagClient,
        source: &Address,
    ) -> Result<BalanceInfo, DagError> {
        let key = (client.deployment().name.clone(), source.clone());
        let now = Instant::now();

        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get_mut(&key) {
                if now.duration_since(entry.fetched_at) < self.ttl {
                    entry.last_used = now;
                    debug!(%source, "simulator cache hit");
                    return Ok(entry.info.clone());
                }
            }
        }

        let info = client.balance(source).await?;

        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                info: info.clone(),
                fetched_at: now,
                last_used: now,
            },
        );
        Ok(info)
    }
}
