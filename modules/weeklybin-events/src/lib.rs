//! Typed in-process publish/subscribe event bus (C12).
//!
//! Delivery is best-effort: if there are no subscribers, `publish` is a
//! no-op; a lagging subscriber misses the oldest unread events rather than
//! blocking the publisher. Nothing here is durable — restart the process and
//! history is gone, which is fine, because spec.md scopes this bus as
//! in-process only, consumed by an external notifier while it's running.

pub mod types;

pub use types::{ConversionEvent, Event, FeedEvent, MediaEvent, PodcastEvent};

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers. A publisher never
    /// observes a subscriber-side failure — `send` only errors when there
    /// are zero receivers, which we treat as "nobody's listening", not an
    /// error.
    pub fn publish(&self, event: impl Into<Event>) {
        let _ = self.sender.send(event.into());
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ConversionEvent;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(ConversionEvent::Started {
            job_id: "j1".into(),
            url: "https://example.com".into(),
        });

        let received = rx.recv().await.unwrap();
        match received {
            Event::Conversion(ConversionEvent::Started { job_id, .. }) => {
                assert_eq!(job_id, "j1");
            }
            _ => panic!("expected Conversion::Started"),
        }
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(ConversionEvent::Started {
            job_id: "j1".into(),
            url: "https://example.com".into(),
        });
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_the_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(FeedEvent::PollCompleted {
            source: "source_a".into(),
            new_items: 3,
            duration_ms: 50,
        });

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }
}
