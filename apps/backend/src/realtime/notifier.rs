use async_trait::async_trait;

use crate::domain::state::QuizId;
use crate::errors::DomainError;

/// Fan-out seam: tells every viewer of a quiz that new state is available.
///
/// At-least-once delivery; duplicates are harmless because consumers
/// re-fetch and compare versions. The flow service logs delivery failures
/// and moves on — a mutation is never rolled back over a lost notification.
#[async_trait]
pub trait QuizNotifier: Send + Sync {
    async fn notify(&self, quiz_id: QuizId, version: i32) -> Result<(), DomainError>;
}
