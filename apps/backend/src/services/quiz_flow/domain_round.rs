//! Domain round: pick a domain, pick a question, answer, pass, evaluate.

use tracing::{debug, info};

use super::{ActionOutcome, QuizFlowService};
use crate::domain::answers::{DomainAnswerSummary, Submission, TeamAnswer, Verdict};
use crate::domain::deadline::Deadline;
use crate::domain::scoring::domain_points;
use crate::domain::state::{
    next_index, next_unattempted, DomainId, Phase, QuestionId, QuizId, QuizStatus, RoundKind,
    TeamId,
};
use crate::domain::whole_pass_quota;
use crate::errors::{DomainError, RejectReason};
use crate::repos::questions::{Question, QuestionUpdate};
use crate::repos::quizzes::{Quiz, QuizUpdate};
use crate::repos::teams::{team_ids, Team};

impl QuizFlowService {
    /// The picking team claims a domain for this selection.
    pub async fn select_domain(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        domain_id: DomainId,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, domain_id, "Selecting domain");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::SelectingDomain
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let teams = self.store.teams_ordered(quiz_id).await?;
        let picker = team_at(&teams, quiz.domain_index)?;
        if picker.id != team_id {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }
        match self.store.find_domain(domain_id).await? {
            Some(domain) if domain.quiz_id == quiz_id => {}
            _ => return Ok(ActionOutcome::rejected(RejectReason::NotFound)),
        }
        if quiz.used_domains.contains(&domain_id) {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }

        let mut used_domains = quiz.used_domains.clone();
        used_domains.push(domain_id);
        let update = QuizUpdate::new()
            .with_selected_domain(Some(domain_id))
            .with_phase(Phase::SelectingQuestion)
            .with_questions_in_domain(0)
            .with_used_domains(used_domains)
            .with_question_selector_index(quiz.domain_index)
            .with_answer_turn_index(quiz.domain_index)
            .with_current_team(Some(team_id))
            .with_last_domain_answer(None);
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, team_id, domain_id, "Domain selected");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The selecting team opens a question from the claimed domain; its
    /// answer window starts immediately.
    pub async fn select_question(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        question_id: QuestionId,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, question_id, "Selecting question");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::SelectingQuestion
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let teams = self.store.teams_ordered(quiz_id).await?;
        let picker = team_at(&teams, quiz.question_selector_index)?;
        if picker.id != team_id {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }
        let selected_domain = quiz.selected_domain_id.ok_or_else(|| {
            DomainError::validation(format!("quiz {quiz_id} selecting a question with no domain"))
        })?;
        let Some(question) = self.store.find_question(question_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if question.domain_id != selected_domain {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        if question.is_answered {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }

        let mut question_update = QuestionUpdate::new()
            .with_selected_by(Some(team_id))
            .with_attempt_by(team_id);
        if question.options_default {
            question_update = question_update.with_options_viewed(true);
        }
        self.store
            .update_question(question_id, question_update)
            .await?;

        let phase = if question.options_default {
            Phase::AnsweringWithOptions
        } else {
            Phase::Answering
        };
        let update = QuizUpdate::new()
            .with_current_question(Some(question_id))
            .with_current_team(Some(team_id))
            .with_answer_turn_index(quiz.question_selector_index)
            .with_phase(phase)
            .with_timer(Some(Deadline::after(
                &*self.clock,
                self.timers.domain_answer,
            )))
            .with_last_domain_answer(None);
        let updated = self.store.update_quiz(quiz_id, update).await?;

        info!(quiz_id, team_id, question_id, ?phase, "Question selected");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The answering team asks for the multiple-choice options, halving the
    /// stakes and forfeiting the right to pass.
    pub async fn show_options(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, "Revealing options");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::Answering
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_team_id != Some(team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }
        let question = self.current_question(&quiz).await?;
        if question.is_answered || question.options_viewed {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }
        if !question.has_options() {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }

        self.store
            .update_question(question.id, QuestionUpdate::new().with_options_viewed(true))
            .await?;
        let updated = self
            .store
            .update_quiz(
                quiz_id,
                QuizUpdate::new().with_phase(Phase::AnsweringWithOptions),
            )
            .await?;

        info!(quiz_id, team_id, question_id = question.id, "Options revealed");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The team on the clock submits its answer, freezing the question
    /// until the host rules on it.
    pub async fn submit_domain_answer(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        question_id: QuestionId,
        answer: &str,
        was_tab_active: bool,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, question_id, "Submitting answer");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || !quiz.phase.is_domain_answering()
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_question_id != Some(question_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let Some(question) = self.store.find_question(question_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if question.is_answered {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }
        if quiz.current_team_id != Some(team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }

        let teams = self.store.teams_ordered(quiz_id).await?;
        let submission = Submission::Text {
            text: answer.to_string(),
        };
        let updated = self
            .record_submission(&quiz, &teams, &question, team_id, submission, was_tab_active)
            .await?;

        info!(quiz_id, team_id, question_id, "Answer submitted");
        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The team on the clock declines the question. Open only while the
    /// options were never shown.
    pub async fn pass_question(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        question_id: QuestionId,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, question_id, "Passing question");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::Answering
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_question_id != Some(question_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let Some(question) = self.store.find_question(question_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if question.is_answered {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }
        if !question.can_pass() {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_team_id != Some(team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }

        let teams = self.store.teams_ordered(quiz_id).await?;
        let updated = self
            .advance_pass(&quiz, &teams, &question, team_id, Submission::Passed)
            .await?;

        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// The host rules on the frozen submission. A wrong answer given
    /// without options passes the question onward; everything else closes
    /// it.
    pub async fn evaluate_domain_answer(
        &self,
        quiz_id: QuizId,
        team_id: TeamId,
        question_id: QuestionId,
        verdict: Verdict,
    ) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, team_id, question_id, ?verdict, "Evaluating answer");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::AwaitingEvaluation
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        if quiz.current_question_id != Some(question_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        }
        let Some(question) = self.store.find_question(question_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if question.is_answered {
            return Ok(ActionOutcome::rejected(RejectReason::AlreadyAnswered));
        }
        if quiz.current_team_id != Some(team_id) {
            return Ok(ActionOutcome::rejected(RejectReason::NotYourTurn));
        }

        let teams = self.store.teams_ordered(quiz_id).await?;
        let with_options = question.with_options();
        let points = domain_points(verdict, with_options);
        if points != 0 {
            self.store.adjust_score(team_id, points).await?;
        }

        // Settle the team's trail entry.
        let mut trail = quiz
            .last_domain_answer
            .as_ref()
            .map(|s| s.all_answers.clone())
            .unwrap_or_default();
        let submission = match trail.iter_mut().find(|a| a.team_id == team_id) {
            Some(entry) => {
                entry.verdict = Some(verdict);
                entry.points = points;
                entry.evaluated = true;
                entry.submission.clone()
            }
            None => {
                let submission = Submission::Text {
                    text: String::new(),
                };
                trail.push(TeamAnswer {
                    team_id,
                    team_name: team_name(&teams, team_id),
                    submission: submission.clone(),
                    verdict: Some(verdict),
                    points,
                    with_options,
                    was_tab_active: false,
                    evaluated: true,
                });
                submission
            }
        };

        let passes_on = verdict == Verdict::Incorrect && question.can_pass();
        let next = if passes_on {
            let ids = team_ids(&teams);
            let mut attempted = question.attempted_by.clone();
            if !attempted.contains(&team_id) {
                attempted.push(team_id);
            }
            next_unattempted(&ids, &attempted, quiz.answer_turn_index)
        } else {
            None
        };

        let summary = DomainAnswerSummary {
            team_id,
            answer: submission,
            verdict: Some(verdict),
            points,
            with_options,
            question_text: question.text.clone(),
            correct_answer: question.answer.clone(),
            question_completed: next.is_none(),
            all_answers: trail,
        };

        let updated = match next {
            Some((index, next_team)) => {
                self.store
                    .update_question(
                        question_id,
                        QuestionUpdate::new()
                            .with_attempt_by(team_id)
                            .with_passed_from(team_id),
                    )
                    .await?;
                let update = QuizUpdate::new()
                    .with_current_team(Some(next_team))
                    .with_phase(Phase::Answering)
                    .with_answer_turn_index(index)
                    .with_timer(Some(Deadline::after(
                        &*self.clock,
                        self.timers.passed_answer,
                    )))
                    .with_last_domain_answer(Some(summary));
                let updated = self.store.update_quiz(quiz_id, update).await?;
                info!(
                    quiz_id,
                    team_id, next_team, "Wrong answer; question passes on"
                );
                updated
            }
            None => {
                let updated = self
                    .close_question(&quiz, &question, summary, Some(team_id))
                    .await?;
                info!(quiz_id, team_id, points, ?verdict, "Answer evaluated; question closed");
                updated
            }
        };

        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Host advances past the result screen: next question in the domain,
    /// next domain selection, or the end of the round.
    pub async fn next_domain_question(&self, quiz_id: QuizId) -> Result<ActionOutcome, DomainError> {
        let lock = self.locks.for_quiz(quiz_id);
        let _guard = lock.lock().await;
        debug!(quiz_id, "Advancing domain round");

        let Some(quiz) = self.store.find_quiz(quiz_id).await? else {
            return Ok(ActionOutcome::rejected(RejectReason::NotFound));
        };
        if quiz.status != QuizStatus::Active
            || quiz.round != RoundKind::Domain
            || quiz.phase != Phase::ShowingResult
        {
            return Ok(ActionOutcome::rejected(RejectReason::NotInPhase));
        }
        let teams = self.store.teams_ordered(quiz_id).await?;
        let domain_id = quiz.selected_domain_id.ok_or_else(|| {
            DomainError::validation(format!("quiz {quiz_id} showing a result with no domain"))
        })?;
        let questions = self.store.domain_questions(domain_id).await?;
        let quota = whole_pass_quota(questions.len(), teams.len());

        let update = if quiz.questions_in_domain >= quota {
            let completed = quiz.completed_domain_rounds + 1;
            if completed >= quiz.total_domain_rounds {
                info!(quiz_id, completed, "Domain round complete");
                QuizUpdate::new()
                    .with_phase(Phase::DomainRoundEnded)
                    .with_current_team(None)
                    .with_current_question(None)
                    .with_selected_domain(None)
                    .with_timer(None)
                    .with_completed_domain_rounds(completed)
            } else {
                let index = next_index(quiz.domain_index, teams.len());
                let picker = team_at(&teams, index)?;
                info!(quiz_id, picker = picker.id, "Next domain selection");
                QuizUpdate::new()
                    .with_phase(Phase::SelectingDomain)
                    .with_current_team(Some(picker.id))
                    .with_current_question(None)
                    .with_selected_domain(None)
                    .with_timer(None)
                    .with_questions_in_domain(0)
                    .with_completed_domain_rounds(completed)
                    .with_domain_index(index)
                    .with_question_selector_index(index)
                    .with_answer_turn_index(index)
            }
        } else {
            let index = next_index(quiz.question_selector_index, teams.len());
            let picker = team_at(&teams, index)?;
            info!(quiz_id, picker = picker.id, "Next question selection");
            QuizUpdate::new()
                .with_phase(Phase::SelectingQuestion)
                .with_current_team(Some(picker.id))
                .with_current_question(None)
                .with_timer(None)
                .with_question_selector_index(index)
                .with_answer_turn_index(index)
        };
        let updated = self.store.update_quiz(quiz_id, update).await?;

        self.notify_changed(quiz_id, updated.version).await;
        Ok(ActionOutcome::Applied)
    }

    /// Consequence of a lapsed answer deadline, invoked by the expiry
    /// checker under the quiz lock. A passable question moves on exactly as
    /// if the team had passed; otherwise an empty timed-out submission is
    /// recorded for evaluation. Returns `None` when the deadline's target
    /// already resolved.
    pub(super) async fn expire_domain_answer(
        &self,
        quiz: &Quiz,
    ) -> Result<Option<Quiz>, DomainError> {
        let (Some(question_id), Some(team_id)) = (quiz.current_question_id, quiz.current_team_id)
        else {
            return Ok(None);
        };
        let Some(question) = self.store.find_question(question_id).await? else {
            return Ok(None);
        };
        if question.is_answered {
            return Ok(None);
        }
        let teams = self.store.teams_ordered(quiz.id).await?;

        let updated = if quiz.phase == Phase::Answering && question.can_pass() {
            info!(
                quiz_id = quiz.id,
                team_id, question_id, "Answer window lapsed; passing on"
            );
            self.advance_pass(quiz, &teams, &question, team_id, Submission::TimedOut)
                .await?
        } else {
            info!(
                quiz_id = quiz.id,
                team_id, question_id, "Answer window lapsed; recording timeout"
            );
            self.record_submission(quiz, &teams, &question, team_id, Submission::TimedOut, false)
                .await?
        };
        Ok(Some(updated))
    }

    /// Records a submission and freezes the question for the host.
    async fn record_submission(
        &self,
        quiz: &Quiz,
        teams: &[Team],
        question: &Question,
        team_id: TeamId,
        submission: Submission,
        was_tab_active: bool,
    ) -> Result<Quiz, DomainError> {
        let with_options = question.with_options();
        let entry = TeamAnswer {
            team_id,
            team_name: team_name(teams, team_id),
            submission: submission.clone(),
            verdict: None,
            points: 0,
            with_options,
            was_tab_active,
            evaluated: false,
        };
        let trail = upsert_trail_entry(quiz.last_domain_answer.as_ref(), entry);
        let summary = DomainAnswerSummary {
            team_id,
            answer: submission,
            verdict: None,
            points: 0,
            with_options,
            question_text: question.text.clone(),
            correct_answer: question.answer.clone(),
            question_completed: false,
            all_answers: trail,
        };
        let update = QuizUpdate::new()
            .with_phase(Phase::AwaitingEvaluation)
            .with_timer(None)
            .with_last_domain_answer(Some(summary));
        self.store.update_quiz(quiz.id, update).await
    }

    /// Moves a declined (or timed-out) question to the next unattempted
    /// team, or closes it once every team has had its shot.
    async fn advance_pass(
        &self,
        quiz: &Quiz,
        teams: &[Team],
        question: &Question,
        team_id: TeamId,
        submission: Submission,
    ) -> Result<Quiz, DomainError> {
        let ids = team_ids(teams);
        let mut attempted = question.attempted_by.clone();
        if !attempted.contains(&team_id) {
            attempted.push(team_id);
        }
        let next = next_unattempted(&ids, &attempted, quiz.answer_turn_index);

        let entry = TeamAnswer {
            team_id,
            team_name: team_name(teams, team_id),
            submission: submission.clone(),
            verdict: None,
            points: 0,
            with_options: false,
            was_tab_active: false,
            evaluated: false,
        };
        let trail = upsert_trail_entry(quiz.last_domain_answer.as_ref(), entry);
        let summary = DomainAnswerSummary {
            team_id,
            answer: submission,
            verdict: None,
            points: 0,
            with_options: false,
            question_text: question.text.clone(),
            correct_answer: question.answer.clone(),
            question_completed: next.is_none(),
            all_answers: trail,
        };

        match next {
            Some((index, next_team)) => {
                self.store
                    .update_question(
                        question.id,
                        QuestionUpdate::new()
                            .with_attempt_by(team_id)
                            .with_passed_from(team_id),
                    )
                    .await?;
                let update = QuizUpdate::new()
                    .with_current_team(Some(next_team))
                    .with_phase(Phase::Answering)
                    .with_answer_turn_index(index)
                    .with_timer(Some(Deadline::after(
                        &*self.clock,
                        self.timers.passed_answer,
                    )))
                    .with_last_domain_answer(Some(summary));
                let updated = self.store.update_quiz(quiz.id, update).await?;
                info!(
                    quiz_id = quiz.id,
                    from_team = team_id,
                    to_team = next_team,
                    "Question passed"
                );
                Ok(updated)
            }
            None => {
                let updated = self
                    .close_question(quiz, question, summary, Some(team_id))
                    .await?;
                info!(
                    quiz_id = quiz.id,
                    question_id = question.id,
                    "Question closed after full pass-around"
                );
                Ok(updated)
            }
        }
    }

    /// Closes the question: snapshot the answer, bump the per-domain count,
    /// show the result.
    async fn close_question(
        &self,
        quiz: &Quiz,
        question: &Question,
        summary: DomainAnswerSummary,
        final_attempt_by: Option<TeamId>,
    ) -> Result<Quiz, DomainError> {
        let mut question_update = QuestionUpdate::new()
            .with_is_answered(true)
            .with_correct_answer(Some(question.answer.clone()));
        if let Some(team) = final_attempt_by {
            question_update = question_update.with_attempt_by(team);
        }
        self.store
            .update_question(question.id, question_update)
            .await?;
        let update = QuizUpdate::new()
            .with_phase(Phase::ShowingResult)
            .with_timer(None)
            .with_questions_in_domain(quiz.questions_in_domain + 1)
            .with_last_domain_answer(Some(summary));
        self.store.update_quiz(quiz.id, update).await
    }

    /// The quiz's current question, which must exist while a domain phase
    /// points at it.
    async fn current_question(&self, quiz: &Quiz) -> Result<Question, DomainError> {
        let question_id = quiz.current_question_id.ok_or_else(|| {
            DomainError::validation(format!("quiz {} has no current question", quiz.id))
        })?;
        self.store.find_question(question_id).await?.ok_or_else(|| {
            DomainError::not_found(
                crate::errors::domain::NotFoundKind::Question,
                format!("question {question_id} not found"),
            )
        })
    }
}

fn team_at(teams: &[Team], index: usize) -> Result<&Team, DomainError> {
    teams.get(index).ok_or_else(|| {
        DomainError::validation(format!(
            "turn index {index} outside roster of {} teams",
            teams.len()
        ))
    })
}

fn team_name(teams: &[Team], team_id: TeamId) -> String {
    teams
        .iter()
        .find(|t| t.id == team_id)
        .map(|t| t.name.clone())
        .unwrap_or_default()
}

/// Replaces the team's previous entry (a pass superseded by a later
/// submission, say) and appends the new one.
fn upsert_trail_entry(
    summary: Option<&DomainAnswerSummary>,
    entry: TeamAnswer,
) -> Vec<TeamAnswer> {
    let mut trail = summary.map(|s| s.all_answers.clone()).unwrap_or_default();
    trail.retain(|a| a.team_id != entry.team_id);
    trail.push(entry);
    trail
}
