//! Rejection reasons for actions that arrive too late, out of turn, or
//! otherwise against the current state.
//!
//! Multiple clients poll and act concurrently, so these are routine: two
//! expiry ticks race, a team double-clicks, a stale screen submits into a
//! phase that already moved on. They flow back to the caller as data with a
//! stable reason code, never as errors.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The acting team is not the one the rotation points at.
    NotYourTurn,
    /// The target was already consumed (question answered, domain used,
    /// buzz or answer already on record).
    AlreadyAnswered,
    /// The action does not exist in the current phase.
    NotInPhase,
    /// The referenced quiz, team, domain or question does not resolve.
    NotFound,
}

impl RejectReason {
    /// Stable wire code; part of the caller contract.
    pub fn as_code(self) -> &'static str {
        match self {
            RejectReason::NotYourTurn => "not_your_turn",
            RejectReason::AlreadyAnswered => "already_answered",
            RejectReason::NotInPhase => "not_in_phase",
            RejectReason::NotFound => "not_found",
        }
    }
}
