use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast publisher for submission lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// Event describing one submission lifecycle transition
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub name: String,
    pub submission_id: Uuid,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    /// Create a new publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a lifecycle event.
    ///
    /// Publishing with no active subscribers is not an error; lifecycle
    /// events are advisory and never gate orchestration progress.
    pub fn publish(&self, name: impl Into<String>, submission_id: Uuid, context: Value) {
        let event = LifecycleEvent {
            name: name.into(),
            submission_id,
            context,
            published_at: Utc::now(),
        };
        let _ = self.sender.send(event);
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
