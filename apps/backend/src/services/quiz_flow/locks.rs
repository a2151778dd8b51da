use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::state::QuizId;

/// Per-quiz write locks.
///
/// Quizzes are independent units of concurrency; within one quiz every
/// mutating operation is serialized, so each one observes the state its
/// predecessor left behind. Lock entries are tiny and quizzes are few, so
/// entries are never reaped.
#[derive(Default)]
pub struct QuizLocks {
    locks: DashMap<QuizId, Arc<Mutex<()>>>,
}

impl QuizLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_quiz(&self, quiz_id: QuizId) -> Arc<Mutex<()>> {
        self.locks
            .entry(quiz_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}
