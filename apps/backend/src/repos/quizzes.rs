//! Quiz aggregate model and its partial-update DTO.

use std::collections::BTreeMap;

use crate::domain::answers::{BuzzerResult, DomainAnswerSummary, PendingBuzzerAnswer};
use crate::domain::deadline::Deadline;
use crate::domain::state::{DomainId, Phase, QuestionId, QuizId, QuizStatus, RoundKind, TeamId};

/// A quiz session as stored. One row per competition; all orchestration
/// state lives here so a single read yields the full picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: QuizId,
    pub status: QuizStatus,
    pub round: RoundKind,
    pub phase: Phase,
    /// Team whose action the current phase is waiting on, if any.
    pub current_team_id: Option<TeamId>,
    pub current_question_id: Option<QuestionId>,
    pub selected_domain_id: Option<DomainId>,
    /// Quiz-wide deadline; `None` in every manually advanced phase.
    pub timer_ends_at: Option<Deadline>,
    /// Buzzer round: teams in the order they buzzed.
    pub buzz_sequence: Vec<TeamId>,
    /// Roster index of the team picking (or having picked) the domain.
    pub domain_index: usize,
    /// Roster index of the team picking the next question.
    pub question_selector_index: usize,
    /// Roster index the pass scan starts from.
    pub answer_turn_index: usize,
    /// Questions resolved inside the currently selected domain.
    pub questions_in_domain: u32,
    /// Domain selections fully played out so far.
    pub completed_domain_rounds: u32,
    /// Total selections this session will play: floor(domains/teams)*teams.
    pub total_domain_rounds: u32,
    pub used_domains: Vec<DomainId>,
    /// Buzzer round: queued answers keyed by team.
    pub pending_buzzer_answers: BTreeMap<TeamId, PendingBuzzerAnswer>,
    /// Buzzer round: personal answer deadlines keyed by team.
    pub buzz_timers: BTreeMap<TeamId, Deadline>,
    /// Settled results of the most recent buzzer question, in buzz order.
    pub last_round_results: Vec<BuzzerResult>,
    /// Most recent domain-question resolution, with the full answer trail.
    pub last_domain_answer: Option<DomainAnswerSummary>,
    /// Bumped on every successful update; carried in notifications so
    /// viewers can drop stale ones.
    pub version: i32,
}

/// Partial update applied atomically to a quiz. Unset fields are left
/// untouched; `Option<Option<_>>` fields distinguish "leave alone" from
/// "clear".
#[derive(Debug, Clone, Default)]
pub struct QuizUpdate {
    pub status: Option<QuizStatus>,
    pub round: Option<RoundKind>,
    pub phase: Option<Phase>,
    pub current_team_id: Option<Option<TeamId>>,
    pub current_question_id: Option<Option<QuestionId>>,
    pub selected_domain_id: Option<Option<DomainId>>,
    pub timer_ends_at: Option<Option<Deadline>>,
    pub buzz_sequence: Option<Vec<TeamId>>,
    pub domain_index: Option<usize>,
    pub question_selector_index: Option<usize>,
    pub answer_turn_index: Option<usize>,
    pub questions_in_domain: Option<u32>,
    pub completed_domain_rounds: Option<u32>,
    pub total_domain_rounds: Option<u32>,
    pub used_domains: Option<Vec<DomainId>>,
    pub pending_buzzer_answers: Option<BTreeMap<TeamId, PendingBuzzerAnswer>>,
    pub buzz_timers: Option<BTreeMap<TeamId, Deadline>>,
    pub last_round_results: Option<Vec<BuzzerResult>>,
    pub last_domain_answer: Option<Option<DomainAnswerSummary>>,
}

impl QuizUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: QuizStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_round(mut self, round: RoundKind) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_current_team(mut self, team: Option<TeamId>) -> Self {
        self.current_team_id = Some(team);
        self
    }

    pub fn with_current_question(mut self, question: Option<QuestionId>) -> Self {
        self.current_question_id = Some(question);
        self
    }

    pub fn with_selected_domain(mut self, domain: Option<DomainId>) -> Self {
        self.selected_domain_id = Some(domain);
        self
    }

    pub fn with_timer(mut self, deadline: Option<Deadline>) -> Self {
        self.timer_ends_at = Some(deadline);
        self
    }

    pub fn with_buzz_sequence(mut self, sequence: Vec<TeamId>) -> Self {
        self.buzz_sequence = Some(sequence);
        self
    }

    pub fn with_domain_index(mut self, index: usize) -> Self {
        self.domain_index = Some(index);
        self
    }

    pub fn with_question_selector_index(mut self, index: usize) -> Self {
        self.question_selector_index = Some(index);
        self
    }

    pub fn with_answer_turn_index(mut self, index: usize) -> Self {
        self.answer_turn_index = Some(index);
        self
    }

    pub fn with_questions_in_domain(mut self, count: u32) -> Self {
        self.questions_in_domain = Some(count);
        self
    }

    pub fn with_completed_domain_rounds(mut self, count: u32) -> Self {
        self.completed_domain_rounds = Some(count);
        self
    }

    pub fn with_total_domain_rounds(mut self, count: u32) -> Self {
        self.total_domain_rounds = Some(count);
        self
    }

    pub fn with_used_domains(mut self, domains: Vec<DomainId>) -> Self {
        self.used_domains = Some(domains);
        self
    }

    pub fn with_pending_buzzer_answers(
        mut self,
        pending: BTreeMap<TeamId, PendingBuzzerAnswer>,
    ) -> Self {
        self.pending_buzzer_answers = Some(pending);
        self
    }

    pub fn with_buzz_timers(mut self, timers: BTreeMap<TeamId, Deadline>) -> Self {
        self.buzz_timers = Some(timers);
        self
    }

    pub fn with_last_round_results(mut self, results: Vec<BuzzerResult>) -> Self {
        self.last_round_results = Some(results);
        self
    }

    pub fn with_last_domain_answer(mut self, summary: Option<DomainAnswerSummary>) -> Self {
        self.last_domain_answer = Some(summary);
        self
    }

    /// Folds the update into a quiz in place. Adapters call this inside
    /// their atomic write; the version bump is the adapter's job.
    pub fn apply(&self, quiz: &mut Quiz) {
        if let Some(v) = self.status {
            quiz.status = v;
        }
        if let Some(v) = self.round {
            quiz.round = v;
        }
        if let Some(v) = self.phase {
            quiz.phase = v;
        }
        if let Some(v) = self.current_team_id {
            quiz.current_team_id = v;
        }
        if let Some(v) = self.current_question_id {
            quiz.current_question_id = v;
        }
        if let Some(v) = self.selected_domain_id {
            quiz.selected_domain_id = v;
        }
        if let Some(v) = self.timer_ends_at {
            quiz.timer_ends_at = v;
        }
        if let Some(v) = &self.buzz_sequence {
            quiz.buzz_sequence = v.clone();
        }
        if let Some(v) = self.domain_index {
            quiz.domain_index = v;
        }
        if let Some(v) = self.question_selector_index {
            quiz.question_selector_index = v;
        }
        if let Some(v) = self.answer_turn_index {
            quiz.answer_turn_index = v;
        }
        if let Some(v) = self.questions_in_domain {
            quiz.questions_in_domain = v;
        }
        if let Some(v) = self.completed_domain_rounds {
            quiz.completed_domain_rounds = v;
        }
        if let Some(v) = self.total_domain_rounds {
            quiz.total_domain_rounds = v;
        }
        if let Some(v) = &self.used_domains {
            quiz.used_domains = v.clone();
        }
        if let Some(v) = &self.pending_buzzer_answers {
            quiz.pending_buzzer_answers = v.clone();
        }
        if let Some(v) = &self.buzz_timers {
            quiz.buzz_timers = v.clone();
        }
        if let Some(v) = &self.last_round_results {
            quiz.last_round_results = v.clone();
        }
        if let Some(v) = &self.last_domain_answer {
            quiz.last_domain_answer = v.clone();
        }
    }
}
