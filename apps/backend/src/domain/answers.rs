//! Answer and evaluation records shared by the domain and buzzer rounds.

use serde::{Deserialize, Serialize};

use crate::domain::state::TeamId;

/// What a team actually put on record for a domain question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    /// A typed answer (possibly empty).
    Text { text: String },
    /// The team declined and sent the question onward.
    Passed,
    /// The answer window lapsed with nothing submitted.
    TimedOut,
}

/// The host's verdict on a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// Settled outcome for one team on a buzzer question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuzzerOutcome {
    Correct,
    Incorrect,
    /// Buzzed but never produced an evaluated answer.
    Timeout,
    /// An earlier team already answered correctly; never evaluated.
    NotReached,
}

/// One entry in the per-question answer trail shown to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAnswer {
    pub team_id: TeamId,
    pub team_name: String,
    pub submission: Submission,
    pub verdict: Option<Verdict>,
    pub points: i32,
    /// Whether the options were visible when this answer was given.
    pub with_options: bool,
    /// Self-reported focus flag captured with the submission, for the host's
    /// fairness audit. Never affects scoring.
    pub was_tab_active: bool,
    pub evaluated: bool,
}

/// The latest domain-question resolution, including the full trail of every
/// team that touched the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAnswerSummary {
    /// Team whose submission is front and center.
    pub team_id: TeamId,
    pub answer: Submission,
    pub verdict: Option<Verdict>,
    pub points: i32,
    pub with_options: bool,
    pub question_text: String,
    pub correct_answer: String,
    /// True once the question is closed and no further pass can happen.
    pub question_completed: bool,
    pub all_answers: Vec<TeamAnswer>,
}

/// A buzzer answer queued for host evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBuzzerAnswer {
    pub answer: String,
    /// Position in the buzz sequence at submission time (0 = first buzzer).
    pub buzz_index: usize,
    pub verdict: Option<Verdict>,
}

impl PendingBuzzerAnswer {
    pub fn needs_evaluation(&self) -> bool {
        self.verdict.is_none()
    }

    pub fn is_first(&self) -> bool {
        self.buzz_index == 0
    }
}

/// Settled result for one team on the most recent buzzer question, in buzz
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerResult {
    pub team_id: TeamId,
    pub answer: String,
    pub outcome: BuzzerOutcome,
    pub points: i32,
}
