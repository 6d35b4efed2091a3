//! Live events: the tagged union delivered to handlers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dagnet_client::TransactionRecord;
use dagnet_core::types::{Address, Amount};

/// Handler registration key: which family of events to receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Transaction,
    BalanceChange,
    Block,
    Custom,
}

/// A tracked address's balance moved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceChangeEvent {
    pub address: Address,
    pub old_balance: Amount,
    pub new_balance: Amount,
    /// `new_balance - old_balance`; negative for outflows.
    pub change: i128,
}

/// A new global snapshot (block tip) was observed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockEvent {
    pub ordinal: u64,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Anything the feed carries that is not one of the built-in families.
#[derive(Clone, Debug)]
pub struct CustomEvent {
    pub name: String,
    pub payload: Value,
}

#[derive(Clone, Debug)]
pub enum EventBody {
    Transaction(TransactionRecord),
    BalanceChange(BalanceChangeEvent),
    Block(BlockEvent),
    Custom(CustomEvent),
}

/// One event as handlers see it.
#[derive(Clone, Debug)]
pub struct Event {
    /// Milliseconds since the Unix epoch, best-effort source time.
    pub timestamp_ms: i64,
    /// Name of the deployment the event came from.
    pub deployment: String,
    pub body: EventBody,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self.body {
            EventBody::Transaction(_) => EventType::Transaction,
            EventBody::BalanceChange(_) => EventType::BalanceChange,
            EventBody::Block(_) => EventType::Block,
            EventBody::Custom(_) => EventType::Custom,
        }
    }

    pub(crate) fn now(deployment: &str, body: EventBody) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            deployment: deployment.to_string(),
            body,
        }
    }
}

/// Parse one line of the push feed. `None` means a malformed entry the
/// stream drops (after counting it).
pub(crate) fn parse_wire_event(deployment: &str, line: &str) -> Option<Event> {
    let value: Value = serde_json::from_str(line).ok()?;
    let type_tag = value.get("type")?.as_str()?.to_string();
    let timestamp_ms = value
        .get("timestamp")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let data = value.get("data").cloned().unwrap_or(Value::Null);

    let body = match type_tag.as_str() {
        "transaction" => EventBody::Transaction(serde_json::from_value(data).ok()?),
        "balance_change" => EventBody::BalanceChange(serde_json::from_value(data).ok()?),
        "block" => EventBody::Block(serde_json::from_value(data).ok()?),
        _ => EventBody::Custom(CustomEvent {
            name: type_tag,
            payload: data,
        }),
    };
    Some(Event {
        timestamp_ms,
        deployment: deployment.to_string(),
        body,
    })
}
