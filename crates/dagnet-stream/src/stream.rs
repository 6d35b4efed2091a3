//! The event stream state machine.
//!
//! One background task owns the feed. In push mode it consumes a
//! line-delimited JSON event feed from the deployment's L0 layer; when the
//! push endpoint keeps failing it degrades to polling the read API on a
//! timer. Handlers run inside the task, in registration order, with
//! failures isolated to the error callbacks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dagnet_client::DagClient;
use dagnet_core::constants::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TX_LIMIT, IDLE_DEAD_SECS, KEEPALIVE_PING_SECS,
    PUSH_FAILURE_THRESHOLD, RECONNECT_BASE_DELAY_SECS, RECONNECT_MAX_DELAY_SECS,
};
use dagnet_core::error::DagError;
use dagnet_core::types::{Address, TxHash};

use crate::event::{parse_wire_event, CustomEvent, Event, EventBody, EventType};
use crate::filter::EventFilter;
use crate::subscription::{EventSubscription, Subscriber};
use crate::tracker::BalanceTracker;

// ── Configuration ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Polling-mode tick interval.
    pub poll_interval: Duration,
    /// Whether to try the push endpoint at all.
    pub push_enabled: bool,
    /// Consecutive push failures before degrading to polling.
    pub push_failure_threshold: u32,
    /// Reconnect backoff base; doubles per consecutive failure.
    pub reconnect_base: Duration,
    /// Reconnect backoff cap.
    pub reconnect_cap: Duration,
    /// Feed considered dead after this much idle time.
    pub idle_dead: Duration,
    /// Server-side keep-alive cadence; informational for the client.
    pub keepalive_ping: Duration,
    /// Page size for polling-mode transaction reads.
    pub poll_tx_limit: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            push_enabled: true,
            push_failure_threshold: PUSH_FAILURE_THRESHOLD,
            reconnect_base: Duration::from_secs(RECONNECT_BASE_DELAY_SECS),
            reconnect_cap: Duration::from_secs(RECONNECT_MAX_DELAY_SECS),
            idle_dead: Duration::from_secs(IDLE_DEAD_SECS),
            keepalive_ping: Duration::from_secs(KEEPALIVE_PING_SECS),
            poll_tx_limit: DEFAULT_POLL_TX_LIMIT,
        }
    }
}

/// Stream lifecycle. `Disconnected` is final: a disconnected stream cannot
/// be reconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

/// Counter snapshot from [`EventStream::stats`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamStats {
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub poll_ticks: u64,
    pub reconnect_attempts: u64,
}

type EventHandler = Arc<dyn Fn(&Event) -> Result<(), DagError> + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&DagError) + Send + Sync>;

// ── Seen-hash window ─────────────────────────────────────────────────────────

/// Bounded dedup window for polled transaction hashes.
struct SeenWindow {
    set: HashSet<TxHash>,
    order: VecDeque<TxHash>,
    cap: usize,
}

impl SeenWindow {
    fn new(cap: usize) -> Self {
        Self {
            set: HashSet::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    /// True when the hash was not seen before.
    fn insert(&mut self, hash: TxHash) -> bool {
        if !self.set.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        while self.order.len() > self.cap {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        true
    }
}

// ── Shared state ─────────────────────────────────────────────────────────────

const SNAPSHOT_UNKNOWN: u64 = u64::MAX;

struct Shared {
    client: DagClient,
    http: reqwest::Client,
    config: StreamConfig,
    state: RwLock<StreamState>,
    handlers: RwLock<HashMap<EventType, Vec<EventHandler>>>,
    error_handlers: RwLock<Vec<ErrorHandler>>,
    subscribers: RwLock<Vec<Subscriber>>,
    filters: RwLock<Vec<(String, EventFilter)>>,
    tracker: BalanceTracker,
    seen: Mutex<SeenWindow>,
    snapshot_ordinal: AtomicU64,
    primed: AtomicBool,
    degraded: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
    ticks: AtomicU64,
    reconnects: AtomicU64,
}

impl Shared {
    fn set_state(&self, state: StreamState) {
        *self.state.write().unwrap() = state;
    }

    fn deliver(&self, event: Event) {
        {
            let filters = self.filters.read().unwrap();
            if !filters.iter().all(|(_, filter)| filter.accepts(&event)) {
                return;
            }
        }
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap()
            .get(&event.event_type())
            .cloned()
            .unwrap_or_default();

        self.delivered.fetch_add(1, Ordering::Relaxed);
        for handler in handlers {
            if let Err(err) = handler(&event) {
                self.report_error(&err);
            }
        }
        self.subscribers
            .write()
            .unwrap()
            .retain(|subscriber| subscriber.offer(&event));
    }

    fn report_error(&self, err: &DagError) {
        warn!(error = %err, "event stream error");
        let callbacks: Vec<ErrorHandler> = self.error_handlers.read().unwrap().clone();
        for callback in callbacks {
            callback(err);
        }
    }

    /// Raised exactly once per stream lifetime.
    fn notify_degraded(&self) {
        if self.degraded.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("push endpoint unavailable; degrading to polling mode");
        self.report_error(&DagError::DegradedToPolling);
        self.deliver(Event::now(
            &self.client.deployment().name,
            EventBody::Custom(CustomEvent {
                name: "degraded_to_polling".into(),
                payload: serde_json::Value::Null,
            }),
        ));
    }
}

// ── Public handle ────────────────────────────────────────────────────────────

/// A long-lived feed of deployment events.
pub struct EventStream {
    shared: Arc<Shared>,
    cancel: Mutex<Option<CancellationToken>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl EventStream {
    pub fn new(client: DagClient) -> Self {
        Self::with_config(client, StreamConfig::default())
    }

    pub fn with_config(client: DagClient, config: StreamConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(config.keepalive_ping)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            shared: Arc::new(Shared {
                client,
                http,
                config,
                state: RwLock::new(StreamState::Idle),
                handlers: RwLock::new(HashMap::new()),
                error_handlers: RwLock::new(Vec::new()),
                subscribers: RwLock::new(Vec::new()),
                filters: RwLock::new(Vec::new()),
                tracker: BalanceTracker::new(),
                seen: Mutex::new(SeenWindow::new(4096)),
                snapshot_ordinal: AtomicU64::new(SNAPSHOT_UNKNOWN),
                primed: AtomicBool::new(false),
                degraded: AtomicBool::new(false),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                ticks: AtomicU64::new(0),
                reconnects: AtomicU64::new(0),
            }),
            cancel: Mutex::new(None),
            task: tokio::sync::Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Register a handler for one event family. Handlers run in
    /// registration order; a failing handler never blocks the ones after
    /// it, and its error goes to the error callbacks.
    pub fn on(
        &self,
        event_type: EventType,
        handler: impl Fn(&Event) -> Result<(), DagError> + Send + Sync + 'static,
    ) {
        self.shared
            .handlers
            .write()
            .unwrap()
            .entry(event_type)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Register an error callback (handler failures, stream notifications).
    pub fn on_error(&self, handler: impl Fn(&DagError) + Send + Sync + 'static) {
        self.shared
            .error_handlers
            .write()
            .unwrap()
            .push(Arc::new(handler));
    }

    /// Add or replace a named filter. Filters AND together.
    pub fn add_filter(&self, name: impl Into<String>, filter: EventFilter) {
        let name = name.into();
        let mut filters = self.shared.filters.write().unwrap();
        if let Some(slot) = filters.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = filter;
        } else {
            filters.push((name, filter));
        }
    }

    pub fn remove_filter(&self, name: &str) {
        self.shared
            .filters
            .write()
            .unwrap()
            .retain(|(n, _)| n != name);
    }

    /// Track an address for balance-change events.
    pub fn track_address(&self, address: Address) {
        self.shared.tracker.track(address);
    }

    pub fn untrack_address(&self, address: &Address) {
        self.shared.tracker.untrack(address);
    }

    /// Subscribe as an async `Stream` instead of registering callbacks.
    /// Pass `None` to receive every event family. The subscription ends
    /// when the stream disconnects or the subscription is dropped.
    pub fn subscribe(&self, interest: Option<EventType>) -> EventSubscription {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        self.shared
            .subscribers
            .write()
            .unwrap()
            .push(Subscriber { interest, sender });
        EventSubscription { receiver }
    }

    // ── Introspection ────────────────────────────────────────────────────────

    pub fn state(&self) -> StreamState {
        *self.shared.state.read().unwrap()
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            events_delivered: self.shared.delivered.load(Ordering::Relaxed),
            events_dropped: self.shared.dropped.load(Ordering::Relaxed),
            poll_ticks: self.shared.ticks.load(Ordering::Relaxed),
            reconnect_attempts: self.shared.reconnects.load(Ordering::Relaxed),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Start the feed. Idempotent while running; reconnecting a stream
    /// that was disconnected is an error.
    pub async fn connect(&self) -> Result<(), DagError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DagError::StreamClosed);
        }
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }
        self.shared.set_state(StreamState::Connecting);
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap() = Some(token.clone());
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(run_loop(shared, token)));
        Ok(())
    }

    /// Stop the feed. Cancels polling timers and the push connection and
    /// waits for the task, so no handler runs after this returns.
    /// Idempotent.
    pub async fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        // Closing the sender halves ends every open subscription.
        self.shared.subscribers.write().unwrap().clear();
        self.shared.set_state(StreamState::Disconnected);
    }

    /// Blocking wrapper over [`EventStream::connect`], driven by the SDK's
    /// private runtime.
    pub fn connect_blocking(&self) -> Result<(), DagError> {
        dagnet_client::blocking::block_on(self.connect())
    }

    /// Blocking wrapper over [`EventStream::disconnect`].
    pub fn disconnect_blocking(&self) {
        dagnet_client::blocking::block_on(self.disconnect())
    }
}

// ── Feed loop ────────────────────────────────────────────────────────────────

enum PushEnd {
    Cancelled,
    /// The attempt ended; `connected` tells whether it ever got a feed.
    Ended { connected: bool },
}

async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut push_failures = 0u32;
    let mut polling = !shared.config.push_enabled;
    let mut was_connected = false;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if !polling {
            shared.set_state(if was_connected {
                StreamState::Reconnecting
            } else {
                StreamState::Connecting
            });

            match run_push(&shared, &cancel).await {
                PushEnd::Cancelled => break,
                PushEnd::Ended { connected } => {
                    if connected {
                        was_connected = true;
                        push_failures = 0;
                    } else {
                        push_failures += 1;
                    }
                    shared.reconnects.fetch_add(1, Ordering::Relaxed);

                    if push_failures >= shared.config.push_failure_threshold {
                        polling = true;
                        shared.notify_degraded();
                        continue;
                    }

                    let exponent = push_failures.saturating_sub(1).min(16);
                    let delay = shared
                        .config
                        .reconnect_base
                        .saturating_mul(2u32.saturating_pow(exponent))
                        .min(shared.config.reconnect_cap);
                    debug!(?delay, push_failures, "push reconnect backoff");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        } else {
            shared.set_state(StreamState::Connected);
            poll_tick(&shared).await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(shared.config.poll_interval) => {}
            }
        }
    }
    shared.set_state(StreamState::Disconnected);
}

/// One push attempt: connect, then consume NDJSON lines until the feed
/// dies, goes idle past the dead threshold, or the stream is cancelled.
async fn run_push(shared: &Arc<Shared>, cancel: &CancellationToken) -> PushEnd {
    let url = shared.client.deployment().l0("/events");
    let deployment = shared.client.deployment().name.clone();

    let response = tokio::select! {
        _ = cancel.cancelled() => return PushEnd::Cancelled,
        response = shared.http.get(&url).send() => response,
    };
    let response = match response {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!(status = %response.status(), "push endpoint refused");
            return PushEnd::Ended { connected: false };
        }
        Err(err) => {
            debug!(error = %err, "push connect failed");
            return PushEnd::Ended { connected: false };
        }
    };

    info!(%url, "push feed connected");
    shared.set_state(StreamState::Connected);
    let mut stream = Box::pin(response.bytes_stream());
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return PushEnd::Cancelled,
            next = tokio::time::timeout(shared.config.idle_dead, stream.next()) => next,
        };
        match next {
            Err(_idle) => {
                warn!("push feed idle past dead threshold; reconnecting");
                return PushEnd::Ended { connected: true };
            }
            Ok(None) => {
                debug!("push feed closed by server");
                return PushEnd::Ended { connected: true };
            }
            Ok(Some(Err(err))) => {
                warn!(error = %err, "push feed read error");
                return PushEnd::Ended { connected: true };
            }
            Ok(Some(Ok(bytes))) => {
                buffer.extend_from_slice(&bytes);
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();
                    // Blank lines and `:`-prefixed comments are keepalives.
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    match parse_wire_event(&deployment, line) {
                        Some(event) => shared.deliver(event),
                        None => {
                            shared.dropped.fetch_add(1, Ordering::Relaxed);
                            debug!("dropped malformed feed entry");
                        }
                    }
                }
            }
        }
    }
}

/// One polling tick: new transactions, snapshot tip, tracked balances.
/// Failures are logged and retried on the next tick.
async fn poll_tick(shared: &Arc<Shared>) {
    let deployment = shared.client.deployment().name.clone();
    shared.ticks.fetch_add(1, Ordering::Relaxed);
    let priming = !shared.primed.swap(true, Ordering::SeqCst);

    match shared
        .client
        .recent_transactions(shared.config.poll_tx_limit)
        .await
    {
        Ok(records) => {
            let mut fresh = Vec::new();
            {
                let mut seen = shared.seen.lock().unwrap();
                // Listings are newest-first; emit in chronological order.
                for record in records.into_iter().rev() {
                    if seen.insert(record.hash) && !priming {
                        fresh.push(record);
                    }
                }
            }
            for record in fresh {
                let timestamp_ms = record.timestamp;
                shared.deliver(Event {
                    timestamp_ms,
                    deployment: deployment.clone(),
                    body: EventBody::Transaction(record),
                });
            }
        }
        Err(err) => warn!(error = %err, "polling transactions failed; retrying next tick"),
    }

    match shared.client.latest_snapshot().await {
        Ok(snapshot) => {
            let previous = shared
                .snapshot_ordinal
                .swap(snapshot.ordinal, Ordering::SeqCst);
            if previous != SNAPSHOT_UNKNOWN && snapshot.ordinal > previous {
                shared.deliver(Event::now(
                    &deployment,
                    EventBody::Block(crate::event::BlockEvent {
                        ordinal: snapshot.ordinal,
                        hash: snapshot.hash,
                    }),
                ));
            }
        }
        Err(err) => debug!(error = %err, "snapshot poll failed"),
    }

    for address in shared.tracker.tracked() {
        match shared.client.balance(&address).await {
            Ok(info) => {
                if let Some(change) = shared.tracker.observe(&deployment, &address, info.balance)
                {
                    shared.deliver(Event::now(&deployment, EventBody::BalanceChange(change)));
                }
            }
            Err(err) => warn!(error = %err, %address, "balance poll failed; retrying next tick"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_window_deduplicates_and_evicts() {
        let mut window = SeenWindow::new(2);
        let a = TxHash::from_bytes([1; 32]);
        let b = TxHash::from_bytes([2; 32]);
        let c = TxHash::from_bytes([3; 32]);

        assert!(window.insert(a));
        assert!(!window.insert(a));
        assert!(window.insert(b));
        assert!(window.insert(c)); // evicts a
        assert!(window.insert(a), "evicted hashes count as new again");
    }

    #[test]
    fn config_defaults_match_protocol_constants() {
        let config = StreamConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.push_failure_threshold, 5);
        assert_eq!(config.reconnect_base, Duration::from_secs(1));
        assert_eq!(config.reconnect_cap, Duration::from_secs(30));
        assert_eq!(config.idle_dead, Duration::from_secs(90));
        assert!(config.push_enabled);
    }
}
