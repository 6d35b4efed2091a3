//! Event filters.
//!
//! Named filters AND together: an event is delivered iff every registered
//! filter accepts it. A filter dimension that does not apply to an event's
//! family (say, an amount range against a block event) accepts vacuously.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dagnet_core::types::{Address, Amount};

use crate::event::{Event, EventBody};

type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// One filter: any subset of address set, transaction-type set, amount
/// range, and a custom predicate.
#[derive(Clone, Default)]
pub struct EventFilter {
    addresses: Option<HashSet<Address>>,
    transaction_types: Option<HashSet<String>>,
    min_amount: Option<Amount>,
    max_amount: Option<Amount>,
    predicate: Option<Predicate>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep events touching any of these addresses.
    pub fn addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.addresses = Some(addresses.into_iter().collect());
        self
    }

    /// Keep transactions whose `type` tag is one of these.
    pub fn transaction_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.transaction_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_amount(mut self, amount: Amount) -> Self {
        self.min_amount = Some(amount);
        self
    }

    pub fn max_amount(mut self, amount: Amount) -> Self {
        self.max_amount = Some(amount);
        self
    }

    /// Arbitrary custom predicate, consulted for every event family.
    pub fn predicate(
        mut self,
        predicate: impl Fn(&Event) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn accepts(&self, event: &Event) -> bool {
        if let Some(addresses) = &self.addresses {
            let touches = match &event.body {
                EventBody::Transaction(record) => {
                    addresses.contains(&record.source) || addresses.contains(&record.destination)
                }
                EventBody::BalanceChange(change) => addresses.contains(&change.address),
                EventBody::Block(_) | EventBody::Custom(_) => true,
            };
            if !touches {
                return false;
            }
        }

        if let Some(types) = &self.transaction_types {
            if let EventBody::Transaction(record) = &event.body {
                let tx_type = record.tx_type.as_deref().unwrap_or("transfer");
                if !types.contains(tx_type) {
                    return false;
                }
            }
        }

        if self.min_amount.is_some() || self.max_amount.is_some() {
            let amount = match &event.body {
                EventBody::Transaction(record) => Some(record.amount as u128),
                EventBody::BalanceChange(change) => Some(change.change.unsigned_abs()),
                _ => None,
            };
            if let Some(amount) = amount {
                if self.min_amount.is_some_and(|min| amount < min as u128) {
                    return false;
                }
                if self.max_amount.is_some_and(|max| amount > max as u128) {
                    return false;
                }
            }
        }

        if let Some(predicate) = &self.predicate {
            if !predicate(event) {
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("addresses", &self.addresses)
            .field("transaction_types", &self.transaction_types)
            .field("min_amount", &self.min_amount)
            .field("max_amount", &self.max_amount)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
