//! Quiz flow orchestration service - bridges pure domain logic with the
//! storage contract.
//!
//! Every mutating method follows the same discipline: take the quiz's
//! write lock, load fresh state, check preconditions, persist one atomic
//! update, notify viewers. A failed precondition is data
//! (`ActionOutcome::Rejected`), not an error - stale clients and racing
//! expiry ticks hit them constantly.

mod buzzer_round;
mod domain_round;
mod expiry;
mod locks;
mod session;

#[cfg(test)]
mod tests_domain_flow;

use std::sync::Arc;

use tracing::warn;

use crate::config::TimerConfig;
use crate::domain::deadline::Clock;
use crate::domain::state::QuizId;
use crate::errors::RejectReason;
use crate::realtime::QuizNotifier;
use crate::repos::store::QuizStore;

pub use locks::QuizLocks;

/// Result of a host or team action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The mutation was persisted and viewers notified.
    Applied,
    /// A precondition failed; nothing changed and nobody was notified.
    Rejected(RejectReason),
}

impl ActionOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }

    pub fn reject_reason(self) -> Option<RejectReason> {
        match self {
            ActionOutcome::Applied => None,
            ActionOutcome::Rejected(reason) => Some(reason),
        }
    }

    pub(crate) fn rejected(reason: RejectReason) -> Self {
        ActionOutcome::Rejected(reason)
    }
}

/// Result of one expiry-checker tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A deadline had passed and its consequence was applied.
    Fired,
    /// Nothing was due.
    Idle,
}

/// The orchestration engine. One instance serves every quiz; per-quiz
/// serialization happens through `QuizLocks`.
pub struct QuizFlowService {
    store: Arc<dyn QuizStore>,
    notifier: Arc<dyn QuizNotifier>,
    clock: Arc<dyn Clock>,
    timers: TimerConfig,
    locks: QuizLocks,
}

impl QuizFlowService {
    pub fn new(
        store: Arc<dyn QuizStore>,
        notifier: Arc<dyn QuizNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_timers(store, notifier, clock, TimerConfig::default())
    }

    pub fn with_timers(
        store: Arc<dyn QuizStore>,
        notifier: Arc<dyn QuizNotifier>,
        clock: Arc<dyn Clock>,
        timers: TimerConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            timers,
            locks: QuizLocks::new(),
        }
    }

    /// Post-mutation notification. Best-effort: a delivery failure is
    /// logged and swallowed; it never unwinds the mutation.
    async fn notify_changed(&self, quiz_id: QuizId, version: i32) {
        if let Err(err) = self.notifier.notify(quiz_id, version).await {
            warn!(quiz_id, version, %err, "state-change notification failed");
        }
    }
}
