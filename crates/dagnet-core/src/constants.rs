//! ─── dagnet protocol constants ──────────────────────────────────────────────
//!
//! Amounts are integers in the network's smallest unit (10⁻⁸ DAG).
//! Address format: `DAG` + one decimal check digit + 36 base58 characters.

// ── Units ────────────────────────────────────────────────────────────────────

/// Smallest units per 1 DAG (the display unit).
pub const UNITS_PER_DAG: u64 = 100_000_000;

/// Exclusive upper bound for amounts, fees and salts: 2⁶³.
pub const MAX_AMOUNT: u64 = 1 << 63;

// ── Addresses ────────────────────────────────────────────────────────────────

/// Literal prefix of every address.
pub const ADDRESS_PREFIX: &str = "DAG";

/// Total address length: prefix (3) + check digit (1) + tail (36).
pub const ADDRESS_LEN: usize = 40;

/// Length of the base58 tail.
pub const ADDRESS_TAIL_LEN: usize = 36;

// ── Data submissions ─────────────────────────────────────────────────────────

/// Maximum canonical-JSON size of a data payload: 64 KiB.
pub const MAX_DATA_BYTES: usize = 64 * 1024;

// ── Transport defaults ───────────────────────────────────────────────────────

/// Default per-request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default retry attempts for retryable transport failures.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential retry backoff (milliseconds). Doubles per attempt.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Connection pool: total connections per deployment.
pub const POOL_MAX_CONNECTIONS: usize = 100;

/// Connection pool: idle connections kept per host.
pub const POOL_MAX_PER_HOST: usize = 30;

// ── Batch engine ─────────────────────────────────────────────────────────────

/// Default maximum operations in flight per batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 32;

// ── Event stream ─────────────────────────────────────────────────────────────

/// Polling-mode tick interval (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Push-mode reconnect backoff: base delay (seconds).
pub const RECONNECT_BASE_DELAY_SECS: u64 = 1;

/// Push-mode reconnect backoff: maximum delay (seconds).
pub const RECONNECT_MAX_DELAY_SECS: u64 = 30;

/// Consecutive push failures before degrading to polling mode.
pub const PUSH_FAILURE_THRESHOLD: u32 = 5;

/// Push connection keep-alive ping interval (seconds).
pub const KEEPALIVE_PING_SECS: u64 = 60;

/// Push connection idle-dead threshold (seconds).
pub const IDLE_DEAD_SECS: u64 = 90;

/// Default `recent_transactions` page size used by polling mode.
pub const DEFAULT_POLL_TX_LIMIT: usize = 50;

// ── Simulator ────────────────────────────────────────────────────────────────

/// Time-to-live for simulator balance/ordinal cache entries (seconds).
pub const SIMULATOR_CACHE_TTL_SECS: u64 = 5;

/// Maximum simulator cache entries before least-recent eviction.
pub const SIMULATOR_CACHE_MAX_ENTRIES: usize = 256;

/// Size assumed for a DER signature when estimating unsigned envelopes.
pub const DER_SIGNATURE_PLACEHOLDER_LEN: usize = 72;

// ── Conversions ──────────────────────────────────────────────────────────────

/// Convert whole DAG to smallest units. Saturates at `u64::MAX`.
pub fn dag_to_units(dag: u64) -> u64 {
    dag.saturating_mul(UNITS_PER_DAG)
}

/// Convert smallest units to a DAG display value.
pub fn units_to_dag(units: u64) -> f64 {
    units as f64 / UNITS_PER_DAG as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversion_round_figures() {
        assert_eq!(dag_to_units(1), 100_000_000);
        assert_eq!(units_to_dag(150_000_000), 1.5);
    }

    #[test]
    fn max_amount_is_two_to_the_63() {
        assert_eq!(MAX_AMOUNT, 9_223_372_036_854_775_808);
    }
}
