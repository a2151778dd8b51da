use serde::{Deserialize, Serialize};

pub type QuizId = i64;
pub type TeamId = i64;
pub type DomainId = i64;
pub type QuestionId = i64;

/// Overall session lifecycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// Roster and question bank are still being assembled.
    Setup,
    /// A round is running and deadlines are authoritative.
    Active,
    /// Frozen by the host; no deadline may fire.
    Paused,
    /// Session over.
    Completed,
}

/// Which round format is currently running.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    NotStarted,
    Domain,
    Buzzer,
}

/// Phase within the active round.
///
/// One flat enum covers both round formats; `RoundKind` disambiguates the
/// shared variants (`Answering`, `AwaitingEvaluation`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No round running yet.
    Waiting,
    /// Domain round: the team at `domain_index` picks a knowledge domain.
    SelectingDomain,
    /// Domain round: the team at `question_selector_index` picks a question.
    SelectingQuestion,
    /// A team is on the clock. In the buzzer round this is the post-buzz state.
    Answering,
    /// Domain round: answering after the multiple-choice options were revealed.
    AnsweringWithOptions,
    /// A submission is frozen pending the host's verdict.
    AwaitingEvaluation,
    /// Domain round: the question's resolution is on display; host advances.
    ShowingResult,
    /// Domain round played its full quota of selections. Terminal.
    DomainRoundEnded,
    /// Buzzer round: the buzz window is open.
    Buzzing,
    /// Buzzer round: the settled question is on display; host advances.
    ShowingAnswer,
    /// Buzzer round exhausted its question list. Terminal.
    Completed,
}

impl Phase {
    /// Domain-round phases during which a team is on the clock.
    pub fn is_domain_answering(self) -> bool {
        matches!(self, Phase::Answering | Phase::AnsweringWithOptions)
    }
}

/// Round-robin index math over the sequence-ordered roster.
///
/// Kept here so every layer shares one source of truth for rotation and
/// "who acts next".
#[inline]
pub fn index_offset(index: usize, delta: usize, team_count: usize) -> usize {
    debug_assert!(team_count > 0, "rotation over an empty roster");
    (index + delta) % team_count
}

/// The next turn index (0 → 1 → … → n-1 → 0).
#[inline]
pub fn next_index(index: usize, team_count: usize) -> usize {
    index_offset(index, 1, team_count)
}

/// Scans forward from `from_index` (exclusive, wrapping) for the next team
/// that has not yet attempted the current question. Returns the roster index
/// and team id, or `None` once every team has attempted.
pub fn next_unattempted(
    team_ids: &[TeamId],
    attempted: &[TeamId],
    from_index: usize,
) -> Option<(usize, TeamId)> {
    let n = team_ids.len();
    for step in 1..=n {
        let candidate = index_offset(from_index, step, n);
        let id = team_ids[candidate];
        if !attempted.contains(&id) {
            return Some((candidate, id));
        }
    }
    None
}
