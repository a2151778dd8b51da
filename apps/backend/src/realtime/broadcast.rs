use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::state::QuizId;
use crate::errors::DomainError;
use crate::realtime::events::EventEnvelope;
use crate::realtime::notifier::QuizNotifier;

/// In-process fan-out over a tokio broadcast channel. Each websocket (or
/// other push) session holds a receiver; a distributed deployment swaps in
/// a notifier backed by its message bus.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<EventEnvelope>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl QuizNotifier for BroadcastNotifier {
    async fn notify(&self, quiz_id: QuizId, version: i32) -> Result<(), DomainError> {
        // send() errs only when nobody is subscribed, which is fine.
        if self
            .sender
            .send(EventEnvelope::QuizStateAvailable { quiz_id, version })
            .is_err()
        {
            debug!(quiz_id, version, "no subscribers for state notification");
        }
        Ok(())
    }
}
