//! In-process `QuizStore` backed by `HashMap` tables behind a single
//! `RwLock`. Serves tests and single-node deployments; a durable adapter
//! implements the same trait against a real database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::state::{DomainId, Phase, QuestionId, QuizId, QuizStatus, RoundKind, TeamId};
use crate::errors::domain::NotFoundKind;
use crate::errors::DomainError;
use crate::repos::buzzer_questions::BuzzerQuestion;
use crate::repos::questions::{Domain, Question, QuestionUpdate};
use crate::repos::quizzes::{Quiz, QuizUpdate};
use crate::repos::store::QuizStore;
use crate::repos::teams::Team;

#[derive(Default)]
struct Tables {
    quizzes: HashMap<QuizId, Quiz>,
    teams: HashMap<TeamId, Team>,
    domains: HashMap<DomainId, Domain>,
    questions: HashMap<QuestionId, Question>,
    buzzer_questions: HashMap<QuestionId, BuzzerQuestion>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding constructors. Session setup (rosters, question banks) is an
    // external concern; these exist so embedders and tests can stock the
    // store directly.

    pub fn create_quiz(&self) -> QuizId {
        let mut tables = self.tables.write();
        let id = tables.allocate_id();
        tables.quizzes.insert(
            id,
            Quiz {
                id,
                status: QuizStatus::Setup,
                round: RoundKind::NotStarted,
                phase: Phase::Waiting,
                current_team_id: None,
                current_question_id: None,
                selected_domain_id: None,
                timer_ends_at: None,
                buzz_sequence: Vec::new(),
                domain_index: 0,
                question_selector_index: 0,
                answer_turn_index: 0,
                questions_in_domain: 0,
                completed_domain_rounds: 0,
                total_domain_rounds: 0,
                used_domains: Vec::new(),
                pending_buzzer_answers: Default::default(),
                buzz_timers: Default::default(),
                last_round_results: Vec::new(),
                last_domain_answer: None,
                version: 0,
            },
        );
        id
    }

    pub fn add_team(&self, quiz_id: QuizId, name: &str) -> TeamId {
        let mut tables = self.tables.write();
        let id = tables.allocate_id();
        let sequence = tables.teams.values().filter(|t| t.quiz_id == quiz_id).count() as u32;
        tables.teams.insert(
            id,
            Team {
                id,
                quiz_id,
                name: name.to_string(),
                captain_name: None,
                score: 0,
                sequence,
            },
        );
        id
    }

    pub fn set_captain(&self, team_id: TeamId, captain_name: Option<&str>) {
        if let Some(team) = self.tables.write().teams.get_mut(&team_id) {
            team.captain_name = captain_name.map(str::to_string);
        }
    }

    pub fn add_domain(&self, quiz_id: QuizId, name: &str) -> DomainId {
        let mut tables = self.tables.write();
        let id = tables.allocate_id();
        tables.domains.insert(
            id,
            Domain {
                id,
                quiz_id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_question(
        &self,
        domain_id: DomainId,
        text: &str,
        answer: &str,
        options: Vec<String>,
        options_default: bool,
    ) -> QuestionId {
        let mut tables = self.tables.write();
        let id = tables.allocate_id();
        let number = tables
            .questions
            .values()
            .filter(|q| q.domain_id == domain_id)
            .count() as u32
            + 1;
        tables.questions.insert(
            id,
            Question {
                id,
                domain_id,
                number,
                text: text.to_string(),
                answer: answer.to_string(),
                options,
                options_default,
                is_answered: false,
                options_viewed: false,
                selected_by: None,
                attempted_by: Vec::new(),
                passed_from: None,
                correct_answer: None,
            },
        );
        id
    }

    pub fn add_buzzer_question(&self, quiz_id: QuizId, text: &str, answer: &str) -> QuestionId {
        let mut tables = self.tables.write();
        let id = tables.allocate_id();
        let number = tables
            .buzzer_questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .count() as u32
            + 1;
        tables.buzzer_questions.insert(
            id,
            BuzzerQuestion {
                id,
                quiz_id,
                number,
                text: text.to_string(),
                answer: answer.to_string(),
                is_answered: false,
            },
        );
        id
    }
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn find_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, DomainError> {
        Ok(self.tables.read().quizzes.get(&quiz_id).cloned())
    }

    async fn update_quiz(&self, quiz_id: QuizId, update: QuizUpdate) -> Result<Quiz, DomainError> {
        let mut tables = self.tables.write();
        let quiz = tables.quizzes.get_mut(&quiz_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Quiz, format!("quiz {quiz_id} not found"))
        })?;
        update.apply(quiz);
        quiz.version += 1;
        Ok(quiz.clone())
    }

    async fn teams_ordered(&self, quiz_id: QuizId) -> Result<Vec<Team>, DomainError> {
        let tables = self.tables.read();
        let mut teams: Vec<Team> = tables
            .teams
            .values()
            .filter(|t| t.quiz_id == quiz_id)
            .cloned()
            .collect();
        teams.sort_by_key(|t| (t.sequence, t.id));
        Ok(teams)
    }

    async fn adjust_score(&self, team_id: TeamId, delta: i32) -> Result<i32, DomainError> {
        let mut tables = self.tables.write();
        let team = tables.teams.get_mut(&team_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Team, format!("team {team_id} not found"))
        })?;
        team.score += delta;
        Ok(team.score)
    }

    async fn count_domains(&self, quiz_id: QuizId) -> Result<usize, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .domains
            .values()
            .filter(|d| d.quiz_id == quiz_id)
            .count())
    }

    async fn find_domain(&self, domain_id: DomainId) -> Result<Option<Domain>, DomainError> {
        Ok(self.tables.read().domains.get(&domain_id).cloned())
    }

    async fn domain_questions(&self, domain_id: DomainId) -> Result<Vec<Question>, DomainError> {
        let tables = self.tables.read();
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.domain_id == domain_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.number, q.id));
        Ok(questions)
    }

    async fn find_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<Question>, DomainError> {
        Ok(self.tables.read().questions.get(&question_id).cloned())
    }

    async fn update_question(
        &self,
        question_id: QuestionId,
        update: QuestionUpdate,
    ) -> Result<Question, DomainError> {
        let mut tables = self.tables.write();
        let question = tables.questions.get_mut(&question_id).ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Question,
                format!("question {question_id} not found"),
            )
        })?;
        update.apply(question);
        Ok(question.clone())
    }

    async fn first_unanswered_buzzer_question(
        &self,
        quiz_id: QuizId,
    ) -> Result<Option<BuzzerQuestion>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .buzzer_questions
            .values()
            .filter(|q| q.quiz_id == quiz_id && !q.is_answered)
            .min_by_key(|q| (q.number, q.id))
            .cloned())
    }

    async fn mark_buzzer_question_answered(
        &self,
        question_id: QuestionId,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.write();
        let question = tables.buzzer_questions.get_mut(&question_id).ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::BuzzerQuestion,
                format!("buzzer question {question_id} not found"),
            )
        })?;
        question.is_answered = true;
        Ok(())
    }

    async fn reset_progress(&self, quiz_id: QuizId) -> Result<(), DomainError> {
        let mut tables = self.tables.write();
        let domain_ids: Vec<DomainId> = tables
            .domains
            .values()
            .filter(|d| d.quiz_id == quiz_id)
            .map(|d| d.id)
            .collect();
        for team in tables.teams.values_mut().filter(|t| t.quiz_id == quiz_id) {
            team.score = 0;
            team.captain_name = None;
        }
        for question in tables
            .questions
            .values_mut()
            .filter(|q| domain_ids.contains(&q.domain_id))
        {
            question.is_answered = false;
            question.options_viewed = false;
            question.selected_by = None;
            question.attempted_by.clear();
            question.passed_from = None;
            question.correct_answer = None;
        }
        for question in tables
            .buzzer_questions
            .values_mut()
            .filter(|q| q.quiz_id == quiz_id)
        {
            question.is_answered = false;
        }
        Ok(())
    }
}
