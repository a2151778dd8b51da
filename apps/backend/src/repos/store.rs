//! The narrow storage contract the engine drives.
//!
//! The durable store behind this trait is an external collaborator; the
//! engine only assumes each method is atomic with respect to other calls
//! touching the same rows. Lookups return `Ok(None)` for missing ids so
//! services can turn them into rejections; updates of rows the engine just
//! read return `NotFound` errors, since vanishing mid-operation means the
//! store broke its contract.

use async_trait::async_trait;

use crate::domain::state::{DomainId, QuestionId, QuizId, TeamId};
use crate::errors::DomainError;
use crate::repos::buzzer_questions::BuzzerQuestion;
use crate::repos::questions::{Domain, Question, QuestionUpdate};
use crate::repos::quizzes::{Quiz, QuizUpdate};
use crate::repos::teams::Team;

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn find_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, DomainError>;

    /// Applies the partial update atomically, bumps the version, and
    /// returns the updated quiz.
    async fn update_quiz(&self, quiz_id: QuizId, update: QuizUpdate) -> Result<Quiz, DomainError>;

    /// The quiz's roster ordered by `sequence`, ties broken by id.
    async fn teams_ordered(&self, quiz_id: QuizId) -> Result<Vec<Team>, DomainError>;

    /// Atomic score increment; returns the new score.
    async fn adjust_score(&self, team_id: TeamId, delta: i32) -> Result<i32, DomainError>;

    async fn count_domains(&self, quiz_id: QuizId) -> Result<usize, DomainError>;

    async fn find_domain(&self, domain_id: DomainId) -> Result<Option<Domain>, DomainError>;

    /// A domain's questions ordered by `number`.
    async fn domain_questions(&self, domain_id: DomainId) -> Result<Vec<Question>, DomainError>;

    async fn find_question(&self, question_id: QuestionId)
        -> Result<Option<Question>, DomainError>;

    async fn update_question(
        &self,
        question_id: QuestionId,
        update: QuestionUpdate,
    ) -> Result<Question, DomainError>;

    /// The lowest-numbered unanswered buzzer question, if any remain.
    async fn first_unanswered_buzzer_question(
        &self,
        quiz_id: QuizId,
    ) -> Result<Option<BuzzerQuestion>, DomainError>;

    async fn mark_buzzer_question_answered(
        &self,
        question_id: QuestionId,
    ) -> Result<(), DomainError>;

    /// Full-reset sweep: zero every score, clear every captain, and restore
    /// every question (both kinds) to untouched.
    async fn reset_progress(&self, quiz_id: QuizId) -> Result<(), DomainError>;
}
