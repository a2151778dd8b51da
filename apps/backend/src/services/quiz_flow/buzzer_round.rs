//! Buzzer round: race to buzz, parallel answer windows, ordered settlement.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{ActionOutcome, QuizFlowService};
use crate::domain::answers::{BuzzerResult, PendingBuzzerAnswer, Verdict};
use crate::domain::deadline::Deadline;
use crate::domain::scoring::settle_buzz_sequence;
use crate::domain::state::{Phase, QuestionId, QuizId, QuizStatus, RoundKind, TeamId};
use crate::errors::{DomainError, RejectReason};
use crate::repos::quizzes::{Quiz, QuizUpdate};

impl QuizFlowService {
    /// A team hits the buzzer. Joins the back of the buzz sequence and
    /// starts the team's personal answer window; the first buzz flips the
    /// phase to answering.
    pub async fn buzz(&self, quiz_id: QuizId, team_id: TeamId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, "Buzz");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Buzzer
            || !matches!(quiz.phase, Phase::Buzzing | Phase::Answering)
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let teams = self.store.teams_ordered(quiz_id).await?;
        if !teams.iter().any(|t| t.id == team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        if quiz.buzz_sequence.contains(&team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }

        let mut sequence = quiz.buzz_sequence.clone();
        sequence.push(team_id);
        let position = sequence.len();
        let mut buzz_timers = quiz.buzz_timers.clone();
        buzz_timers.insert(
            team_id,
            Deadline::after(&*self.clock, self.timers.buzzer_answer),
        );
        let mut update = QuizUpdate::new()
            .with_buzz_sequence(sequence)
            .with_buzz_timers(buzz_timers);
        if quiz.phase == Phase::Buzzing {
            update = update.with_phase(Phase::Answering);
        }
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, team_id, position, "Team buzzed");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// A buzzed team queues its answer. No phase change here: the question
    /// settles only after every buzzed team has answered or run out its
    /// personal window.
    pub async fn submit_buzzer_answer(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        question_id: QuestionId,
        answer: &str,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, question_id, "Submitting buzzer answer");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Buzzer
            || quiz.phase != Phase::Answering
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_question_id != Some(question_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let Some(position) = quiz.buzz_sequence.iter().position(|&t| t == team_id) else {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        };
        if quiz.pending_buzzer_answers.contains_key(&team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }

        let mut pending = quiz.pending_buzzer_answers.clone();
        pending.insert(
            team_id,
            PendingBuzzerAnswer {
                answer: answer.to_string(),
                buzz_index: position,
                verdict: None,
            },
        );
        let updated = self
            .store
            .update_quiz(quiz_id, QuizUpdate::new().with_pending_buzzer_answers(pending))
            .await?;

        info!(quiz_id, team_id, buzz_index = position, "Buzzer answer queued");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The host marks one queued answer correct or incorrect. Repeating the
    /// call before completion overrides the earlier verdict.
    pub async fn evaluate_buzzer_answer(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        verdict: Verdict,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, ?verdict, "Evaluating buzzer answer");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Buzzer
            || quiz.phase != Phase::AwaitingEvaluation
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let Some(position) = quiz.buzz_sequence.iter().position(|&t| t == team_id) else {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        };

        let mut pending = quiz.pending_buzzer_answers.clone();
        pending
            .entry(team_id)
            .or_insert_with(|| PendingBuzzerAnswer {
                answer: String::new(),
                buzz_index: position,
                verdict: None,
            })
            .verdict = Some(verdict);
        let updated = self
            .store
            .update_quiz(quiz_id, QuizUpdate::new().with_pending_buzzer_answers(pending))
            .await?;

        info!(quiz_id, team_id, ?verdict, "Buzzer answer evaluated");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The host finishes evaluating: walk the buzz sequence, apply every
    /// award and penalty, close the question.
    pub async fn complete_evaluation(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, "Completing buzzer evaluation");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Buzzer
            || quiz.phase != Phase::AwaitingEvaluation
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let question_id = quiz.current_question_id.ok_or_else(|| {
            DomainError::validation(format!("quiz {quiz_id} evaluating with no current question"))
        })?;

        let results = settle_buzz_sequence(&quiz.buzz_sequence, &quiz.pending_buzzer_answers);
        for result in &results {
            if result.points != 0 {
                self.store.adjust_score(result.team_id, result.points).await?;
            }
        }
        self.store.mark_buzzer_question_answered(question_id).await?;

        let update = QuizUpdate::new()
            .with_phase(Phase::ShowingAnswer)
            .with_timer(None)
            .with_last_round_results(results)
            .with_pending_buzzer_answers(BTreeMap::new())
            .with_buzz_timers(BTreeMap::new());
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, question_id, "Buzzer evaluation completed");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Host advances past the answer screen: open the next question's buzz
    /// window, or finish the session when none remain.
    pub async fn next_buzzer_question(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, "Advancing buzzer round");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Buzzer
            || quiz.phase != Phase::ShowingAnswer
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }

        let update = match self.store.first_unanswered_buzzer_question(quiz_id).await? {
            Some(question) => {
                info!(quiz_id, question_id = question.id, "Next buzzer question");
                QuizUpdate::new()
                    .with_phase(Phase::Buzzing)
                    .with_current_question(Some(question.id))
                    .with_current_team(None)
                    .with_timer(Some(Deadline::after(&*self.clock, self.timers.buzz_window)))
                    .with_buzz_sequence(Vec::new())
                    .with_pending_buzzer_answers(BTreeMap::new())
                    .with_buzz_timers(BTreeMap::new())
                    .with_last_round_results(Vec::new())
            }
            None => {
                info!(quiz_id, "Buzzer round exhausted; quiz completed");
                QuizUpdate::new()
                    .with_status(QuizStatus::Completed)
                    .with_phase(Phase::Completed)
                    .with_current_question(None)
                    .with_current_team(None)
                    .with_timer(None)
                    .with_buzz_sequence(Vec::new())
                    .with_pending_buzzer_answers(BTreeMap::new())
                    .with_buzz_timers(BTreeMap::new())
            }
        };
        let updated = self.store.update_quiz(quiz_id, update).await?;

        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Expiry consequence once the buzz window is shut and every buzzed
    /// team is done: freeze for evaluation if any queued answer needs a
    /// verdict, otherwise settle everyone as timed out and close.
    pub(super) async fn process_buzzer_answers(&self, quiz: &Quiz) -> Result<Quiz, DomainError> {
        if quiz
            .pending_buzzer_answers
            .values()
            .any(|a| a.needs_evaluation())
        {
            let update = QuizUpdate::new()
                .with_phase(Phase::AwaitingEvaluation)
                .with_timer(None);
            let updated = self.store.update_quiz(quiz.id, update).await?;
            info!(quiz_id = quiz.id, "Buzzer answers frozen for evaluation");
            Ok(updated)
        } else {
            // Nothing queued: every buzzed team ran out its window.
            let results = settle_buzz_sequence(&quiz.buzz_sequence, &quiz.pending_buzzer_answers);
            info!(
                quiz_id = quiz.id,
                timeouts = results.len(),
                "All buzzers timed out; closing question"
            );
            self.close_buzzer_question(quiz, results).await
        }
    }

    /// Closes the current buzzer question with the given settled results
    /// (possibly empty, when nobody buzzed). Applies score deltas, consumes
    /// the question, and either shows the answer or ends the session when
    /// the question list is exhausted.
    pub(super) async fn close_buzzer_question(
        &self,
        quiz: &Quiz,
        results: Vec<BuzzerResult>,
    ) -> Result<Quiz, DomainError> {
        let question_id = quiz.current_question_id.ok_or_else(|| {
            DomainError::validation(format!("quiz {} closing with no current question", quiz.id))
        })?;
        for result in &results {
            if result.points != 0 {
                self.store.adjust_score(result.team_id, result.points).await?;
            }
        }
        self.store.mark_buzzer_question_answered(question_id).await?;
        let more_questions = self
            .store
            .first_unanswered_buzzer_question(quiz.id)
            .await?
            .is_some();

        let mut update = QuizUpdate::new()
            .with_current_team(None)
            .with_timer(None)
            .with_buzz_sequence(Vec::new())
            .with_pending_buzzer_answers(BTreeMap::new())
            .with_buzz_timers(BTreeMap::new())
            .with_last_round_results(results);
        update = if more_questions {
            update.with_phase(Phase::ShowingAnswer)
        } else {
            update
                .with_phase(Phase::Completed)
                .with_status(QuizStatus::Completed)
        };
        self.store.update_quiz(quiz.id, update).await
    }
}
