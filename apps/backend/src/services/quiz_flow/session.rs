//! Session lifecycle: starting rounds, pause, resume, reset.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{ActionOutcome, QuizFlowService};
use crate::domain::deadline::Deadline;
use crate::domain::state::{Phase, QuizId, QuizStatus, RoundKind};
use crate::domain::whole_pass_quota;
use crate::errors::{DomainError, RejectReason};
use crate::repos::quizzes::QuizUpdate;

impl QuizFlowService {
    /// Begin the domain round from the top of the roster.
    ///
    /// The session plays `floor(domains / teams) * teams` domain selections
    /// in total, so every team picks equally often.
    pub async fn start_domain_round(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, "Starting domain round");

        if self.store.find_quiz(quiz_id).await?.is_none() {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let teams = self.store.teams_ordered(quiz_id).await?;
        let Some(first_team) = teams.first() else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        let domain_count = self.store.count_domains(quiz_id).await?;
        let total_rounds = whole_pass_quota(domain_count, teams.len());

        // Fewer domains than teams leaves no whole pass to play: the
        // round opens and ends in the same step, no selection happens.
        let (phase, current_team) = if total_rounds == 0 {
            (Phase::DomainRoundEnded, None)
        } else {
            (Phase::SelectingDomain, Some(first_team.id))
        };
        let update = QuizUpdate::new()
            .with_status(QuizStatus::Active)
            .with_round(RoundKind::Domain)
            .with_phase(phase)
            .with_current_team(current_team)
            .with_current_question(None)
            .with_selected_domain(None)
            .with_timer(None)
            .with_domain_index(0)
            .with_question_selector_index(0)
            .with_answer_turn_index(0)
            .with_questions_in_domain(0)
            .with_completed_domain_rounds(0)
            .with_total_domain_rounds(total_rounds)
            .with_used_domains(Vec::new())
            .with_buzz_sequence(Vec::new())
            .with_pending_buzzer_answers(BTreeMap::new())
            .with_buzz_timers(BTreeMap::new())
            .with_last_round_results(Vec::new())
            .with_last_domain_answer(None);
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(
            quiz_id,
            total_rounds,
            team_count = teams.len(),
            "Domain round started"
        );
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Begin the buzzer round at the lowest-numbered unplayed question.
    pub async fn start_buzzer_round(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, "Starting buzzer round");

        if self.store.find_quiz(quiz_id).await?.is_none() {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let Some(question) = self.store.first_unanswered_buzzer_question(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };

        let update = QuizUpdate::new()
            .with_status(QuizStatus::Active)
            .with_round(RoundKind::Buzzer)
            .with_phase(Phase::Buzzing)
            .with_current_team(None)
            .with_current_question(Some(question.id))
            .with_selected_domain(None)
            .with_timer(Some(Deadline::after(&*self.clock, self.timers.buzz_window)))
            .with_buzz_sequence(Vec::new())
            .with_pending_buzzer_answers(BTreeMap::new())
            .with_buzz_timers(BTreeMap::new())
            .with_last_round_results(Vec::new());
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, question_id = question.id, "Buzzer round started");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Freeze the session. The quiz-wide deadline is cleared so nothing can
    /// fire; personal buzz deadlines stay stored but the checkers ignore
    /// every quiz that is not active.
    pub async fn pause(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;

        if self.store.find_quiz(quiz_id).await?.is_none() {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let update = QuizUpdate::new()
            .with_status(QuizStatus::Paused)
            .with_timer(None);
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, "Quiz paused");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Unfreeze. A timed phase restarts with a fresh full window; the time
    /// remaining at pause is deliberately not restored, since no remaining
    /// duration is stored anywhere.
    pub async fn resume(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        let mut update = QuizUpdate::new().with_status(QuizStatus::Active);
        match (quiz.round, quiz.phase) {
            (RoundKind::Domain, phase) if phase.is_domain_answering() => {
                update = update.with_timer(Some(Deadline::after(
                    &*self.clock,
                    self.timers.domain_answer,
                )));
            }
            (RoundKind::Buzzer, Phase::Buzzing) => {
                update =
                    update.with_timer(Some(Deadline::after(&*self.clock, self.timers.buzz_window)));
            }
            (RoundKind::Buzzer, Phase::Answering) => {
                // Fresh personal windows for teams that buzzed but have not
                // queued an answer yet.
                let mut buzz_timers = quiz.buzz_timers.clone();
                for team in &quiz.buzz_sequence {
                    if !quiz.pending_buzzer_answers.contains_key(team) {
                        buzz_timers.insert(
                            *team,
                            Deadline::after(&*self.clock, self.timers.buzzer_answer),
                        );
                    }
                }
                update = update
                    .with_timer(Some(Deadline::after(
                        &*self.clock,
                        self.timers.buzzer_answer,
                    )))
                    .with_buzz_timers(buzz_timers);
            }
            // Manually advanced phases stay timerless.
            _ => {
                update = update.with_timer(None);
            }
        }
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, phase = ?quiz.phase, "Quiz resumed");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Wipe the session back to setup: zero every score, vacate every
    /// captain seat, restore every question, clear all orchestration state.
    pub async fn reset(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;

        if self.store.find_quiz(quiz_id).await?.is_none() {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        self.store.reset_progress(quiz_id).await?;
        let update = QuizUpdate::new()
            .with_status(QuizStatus::Setup)
            .with_round(RoundKind::NotStarted)
            .with_phase(Phase::Waiting)
            .with_current_team(None)
            .with_current_question(None)
            .with_selected_domain(None)
            .with_timer(None)
            .with_domain_index(0)
            .with_question_selector_index(0)
            .with_answer_turn_index(0)
            .with_questions_in_domain(0)
            .with_completed_domain_rounds(0)
            .with_total_domain_rounds(0)
            .with_used_domains(Vec::new())
            .with_buzz_sequence(Vec::new())
            .with_pending_buzzer_answers(BTreeMap::new())
            .with_buzz_timers(BTreeMap::new())
            .with_last_round_results(Vec::new())
            .with_last_domain_answer(None);
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, "Quiz reset to setup");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }
}
