//! Domain-round question bank: domains, their questions, and the
//! question-progress update DTO.

use crate::domain::state::{DomainId, QuestionId, QuizId, TeamId};

/// A knowledge domain (category). Selected at most once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub id: DomainId,
    pub quiz_id: QuizId,
    pub name: String,
}

/// A question inside a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub domain_id: DomainId,
    /// Display number within the domain, 1-based.
    pub number: u32,
    pub text: String,
    pub answer: String,
    pub options: Vec<String>,
    /// Options are shown from the moment of selection; passing is forfeit.
    pub options_default: bool,
    pub is_answered: bool,
    pub options_viewed: bool,
    /// Team that originally picked the question.
    pub selected_by: Option<TeamId>,
    /// Every team that has had a shot at this question.
    pub attempted_by: Vec<TeamId>,
    /// First team that passed the question onward, if any.
    pub passed_from: Option<TeamId>,
    /// Snapshot of `answer` taken when the question closes.
    pub correct_answer: Option<String>,
}

impl Question {
    /// Whether answers to this question count as "with options".
    pub fn with_options(&self) -> bool {
        self.options_viewed || self.options_default
    }

    /// Passing is only open while the options have never been shown.
    pub fn can_pass(&self) -> bool {
        !self.options_viewed && !self.options_default
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

/// Partial update applied atomically to a question.
#[derive(Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub is_answered: Option<bool>,
    pub options_viewed: Option<bool>,
    pub selected_by: Option<Option<TeamId>>,
    /// Appended to `attempted_by` if not already present.
    pub attempt_by: Option<TeamId>,
    /// Only recorded if `passed_from` is still empty.
    pub passed_from: Option<TeamId>,
    pub correct_answer: Option<Option<String>>,
}

impl QuestionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_is_answered(mut self, answered: bool) -> Self {
        self.is_answered = Some(answered);
        self
    }

    pub fn with_options_viewed(mut self, viewed: bool) -> Self {
        self.options_viewed = Some(viewed);
        self
    }

    pub fn with_selected_by(mut self, team: Option<TeamId>) -> Self {
        self.selected_by = Some(team);
        self
    }

    pub fn with_attempt_by(mut self, team: TeamId) -> Self {
        self.attempt_by = Some(team);
        self
    }

    pub fn with_passed_from(mut self, team: TeamId) -> Self {
        self.passed_from = Some(team);
        self
    }

    pub fn with_correct_answer(mut self, answer: Option<String>) -> Self {
        self.correct_answer = Some(answer);
        self
    }

    pub fn apply(&self, question: &mut Question) {
        if let Some(v) = self.is_answered {
            question.is_answered = v;
        }
        if let Some(v) = self.options_viewed {
            question.options_viewed = v;
        }
        if let Some(v) = self.selected_by {
            question.selected_by = v;
        }
        if let Some(team) = self.attempt_by {
            if !question.attempted_by.contains(&team) {
                question.attempted_by.push(team);
            }
        }
        if let Some(team) = self.passed_from {
            question.passed_from.get_or_insert(team);
        }
        if let Some(v) = &self.correct_answer {
            question.correct_answer = v.clone();
        }
    }
}
