use newsroom_core::config::BROADCAST_CAPACITY;
use newsroom_core::event::EventFrame;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Process-wide fan-out point for named events.
///
/// Producers (the publication sweeper, the news write paths) call
/// [`publish`](Self::publish) without knowing which or how many observers
/// exist. Each WebSocket connection subscribes at connect time and is
/// deregistered implicitly when its receiver is dropped at disconnect; the
/// tokio broadcast channel is the concurrency-safe observer registry, so a
/// disconnect mid-broadcast can never corrupt the fan-out.
///
/// Delivery is best-effort and fire-and-forget: no backlog, no replay, and a
/// slow or failed observer affects only its own connection task.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<String>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// New observer subscribes to the broadcast stream.
    ///
    /// Only events published after this call are received — a subscriber
    /// never sees earlier traffic.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Push a named event with a JSON payload to all current observers.
    ///
    /// Infallible by contract: with zero observers the event is silently
    /// dropped, and per-observer transport failures surface only inside that
    /// observer's connection task. Write paths may call this unconditionally
    /// after a successful mutation.
    pub fn publish(&self, event: &str, data: impl Serialize) {
        let frame = EventFrame::new(event, data);
        let receivers = self.tx.send(frame.to_wire()).unwrap_or(0);
        debug!(%event, receivers, "event published");
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsroom_core::event::{EventFrame, NEWS_CREATED};

    #[tokio::test]
    async fn publish_with_no_observers_is_a_no_op() {
        let broadcaster = EventBroadcaster::new();
        // Must not panic or error with nobody listening.
        broadcaster.publish(NEWS_CREATED, serde_json::json!({"message": "m"}));
        assert_eq!(broadcaster.observer_count(), 0);
    }

    #[tokio::test]
    async fn every_observer_receives_the_event() {
        let broadcaster = EventBroadcaster::new();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        broadcaster.publish(NEWS_CREATED, serde_json::json!({"message": "hello"}));

        for rx in [&mut rx1, &mut rx2] {
            let wire = rx.recv().await.unwrap();
            let frame: EventFrame = serde_json::from_str(&wire).unwrap();
            assert_eq!(frame.event, NEWS_CREATED);
            assert_eq!(frame.data["message"], "hello");
        }
    }

    #[tokio::test]
    async fn dropped_observer_does_not_affect_others() {
        let broadcaster = EventBroadcaster::new();
        let rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        // Observer 1's transport dies mid-session.
        drop(rx1);

        broadcaster.publish(NEWS_CREATED, serde_json::json!({"message": "still here"}));
        let wire = rx2.recv().await.unwrap();
        assert!(wire.contains("still here"));
        assert_eq!(broadcaster.observer_count(), 1);
    }

    #[tokio::test]
    async fn late_subscriber_never_sees_earlier_events() {
        let broadcaster = EventBroadcaster::new();
        // Keep one live receiver so the send is not dropped for lack of observers.
        let _rx1 = broadcaster.subscribe();

        broadcaster.publish(NEWS_CREATED, serde_json::json!({"message": "early"}));

        let mut late = broadcaster.subscribe();
        broadcaster.publish(NEWS_CREATED, serde_json::json!({"message": "late"}));

        let wire = late.recv().await.unwrap();
        assert!(wire.contains("late"));
        // Nothing further queued for the late subscriber.
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn observer_receives_events_in_publish_order() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        for i in 0..5 {
            broadcaster.publish(NEWS_CREATED, serde_json::json!({ "n": i }));
        }
        for i in 0..5 {
            let wire = rx.recv().await.unwrap();
            let frame: EventFrame = serde_json::from_str(&wire).unwrap();
            assert_eq!(frame.data["n"], i);
        }
    }
}
