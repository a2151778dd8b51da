//! Stateless deadline enforcement.
//!
//! Nothing is ever scheduled: a deadline is a stored timestamp, and an
//! external loop calls these checkers on a short period. Each tick takes
//! the quiz's write lock, re-reads state, and applies at most one
//! consequence. Re-checking under the lock makes racing ticks converge -
//! the loser finds the phase already moved on and reports `Idle`.

use tracing::info;

use super::{QuizFlowService, TickOutcome};
use crate::domain::state::{Phase, QuizId, QuizStatus, RoundKind};
use crate::errors::DomainError;

impl QuizFlowService {
    /// Fires a lapsed domain-round answer deadline: a passable question
    /// moves to the next team exactly as if the holder had passed, anything
    /// else freezes an empty timed-out submission for the host.
    pub async fn check_domain_timers(&self, quiz_id: QuizId) -> Result<TickOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(TickOutcome::Idle);
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || !quiz.phase.is_domain_answering()
        {
            return Ok(TickOutcome::Idle);
        }
        let Some(deadline) = quiz.timer_ends_at else {
            return Ok(TickOutcome::Idle);
        };
        if !deadline.has_passed(&*self.clock) {
            return Ok(TickOutcome::Idle);
        }

        match self.expire_domain_answer(&quiz).await? {
            Some(updated) => {
                self.notify_changed(quiz_id, updated.version).await;
                Ok(TickOutcome::Fired)
            }
            None => Ok(TickOutcome::Idle),
        }
    }

    /// Fires lapsed buzzer-round deadlines. Two cases once the buzz window
    /// is shut: nobody buzzed, so the question closes unscored; or everyone
    /// who buzzed has either queued an answer or run out their personal
    /// window, so the question settles.
    pub async fn check_buzzer_timers(&self, quiz_id: QuizId) -> Result<TickOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(TickOutcome::Idle);
        };
        if quiz.status != QuizStatus::Active || quiz.round != RoundKind::Buzzer {
            return Ok(TickOutcome::Idle);
        }
        let Some(window) = quiz.timer_ends_at else {
            return Ok(TickOutcome::Idle);
        };
        if !window.has_passed(&*self.clock) {
            return Ok(TickOutcome::Idle);
        }

        match quiz.phase {
            Phase::Buzzing => {
                if !quiz.buzz_sequence.is_empty() {
                    return Ok(TickOutcome::Idle);
                }
                info!(quiz_id, "Buzz window closed with no buzzes");
                let updated = self.close_buzzer_question(&quiz, Vec::new()).await?;
                self.notify_changed(quiz_id, updated.version).await;
                Ok(TickOutcome::Fired)
            }
            Phase::Answering => {
                let all_done = quiz.buzz_sequence.iter().all(|team| {
                    quiz.pending_buzzer_answers.contains_key(team)
                        || quiz
                            .buzz_timers
                            .get(team)
                            .is_some_and(|d| d.has_passed(&*self.clock))
                });
                if !all_done {
                    return Ok(TickOutcome::Idle);
                }
                let updated = self.process_buzzer_answers(&quiz).await?;
                self.notify_changed(quiz_id, updated.version).await;
                Ok(TickOutcome::Fired)
            }
            _ => Ok(TickOutcome::Idle),
        }
    }
}
