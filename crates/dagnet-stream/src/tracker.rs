//! Balance tracker: per-deployment cache of observed balances for a
//! caller-chosen address set.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use dagnet_core::types::{Address, Amount};

use crate::event::BalanceChangeEvent;

#[derive(Default)]
pub struct BalanceTracker {
    tracked: RwLock<HashSet<Address>>,
    /// Cache keyed by `(deployment, address)`.
    balances: RwLock<HashMap<(String, Address), Amount>>,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, address: Address) {
        self.tracked.write().unwrap().insert(address);
    }

    pub fn untrack(&self, address: &Address) {
        self.tracked.write().unwrap().remove(address);
    }

    pub fn tracked(&self) -> Vec<Address> {
        self.tracked.read().unwrap().iter().cloned().collect()
    }

    /// Record a fresh observation. Returns an event when the cached value
    /// differs; the first observation only primes the cache.
    pub fn observe(
        &self,
        deployment: &str,
        address: &Address,
        balance: Amount,
    ) -> Option<BalanceChangeEvent> {
        let key = (deployment.to_string(), address.clone());
        let mut balances = self.balances.write().unwrap();
        match balances.insert(key, balance) {
            Some(old) if old != balance => Some(BalanceChangeEvent {
                address: address.clone(),
                old_balance: old,
                new_balance: balance,
                change: balance as i128 - old as i128,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> Address {
        format!("DAG0{}", "c".repeat(36)).parse().unwrap()
    }

    #[test]
    fn first_observation_primes_silently() {
        let tracker = BalanceTracker::new();
        assert!(tracker.observe("test", &addr(), 100).is_none());
    }

    #[test]
    fn change_reports_signed_delta() {
        let tracker = BalanceTracker::new();
        let address = addr();
        tracker.observe("test", &address, 100);

        let up = tracker.observe("test", &address, 150).unwrap();
        assert_eq!(up.old_balance, 100);
        assert_eq!(up.new_balance, 150);
        assert_eq!(up.change, 50);

        let down = tracker.observe("test", &address, 20).unwrap();
        assert_eq!(down.change, -130);
    }

    #[test]
    fn unchanged_balance_is_silent() {
        let tracker = BalanceTracker::new();
        let address = addr();
        tracker.observe("test", &address, 100);
        assert!(tracker.observe("test", &address, 100).is_none());
    }

    #[test]
    fn caches_are_per_deployment() {
        let tracker = BalanceTracker::new();
        let address = addr();
        tracker.observe("test", &address, 100);
        // Same address on another deployment primes independently.
        assert!(tracker.observe("integration", &address, 999).is_none());
    }
}
