//! Pull-style consumption: a `Stream` of events.
//!
//! Callback handlers ([`crate::EventStream::on`]) run inside the feed
//! task; a subscription instead hands events to the caller's own task
//! through a channel, as a `futures::Stream`.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::event::{Event, EventType};

/// A live event feed as an async stream. Ends (`None`) when the owning
/// [`crate::EventStream`] disconnects.
pub struct EventSubscription {
    pub(crate) receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventSubscription {
    /// Await the next matching event; `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Stream for EventSubscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}

/// Sender half kept by the feed task.
pub(crate) struct Subscriber {
    pub(crate) interest: Option<EventType>,
    pub(crate) sender: mpsc::UnboundedSender<Event>,
}

impl Subscriber {
    /// Forward a matching event. False when the receiver is gone and the
    /// subscriber should be dropped.
    pub(crate) fn offer(&self, event: &Event) -> bool {
        if self
            .interest
            .is_some_and(|interest| interest != event.event_type())
        {
            return true;
        }
        self.sender.send(event.clone()).is_ok()
    }
}
