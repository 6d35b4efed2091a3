//! Live event streaming: push with polling fallback, filters, and the
//! balance tracker.

pub mod event;
pub mod filter;
pub mod stream;
pub mod subscription;
pub mod tracker;

pub use event::{
    BalanceChangeEvent, BlockEvent, CustomEvent, Event, EventBody, EventType,
};
pub use filter::EventFilter;
pub use stream::{EventStream, StreamConfig, StreamState, StreamStats};
pub use subscription::EventSubscription;
pub use tracker::BalanceTracker;
