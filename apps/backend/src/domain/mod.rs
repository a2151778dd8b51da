//! Pure quiz logic: state enums, rotation math, scoring, deadlines.
//!
//! Nothing in this module touches storage or the clock's real time; the
//! services layer wires these helpers to the store and notifier.

pub mod answers;
pub mod deadline;
pub mod rules;
pub mod scoring;
pub mod state;

#[cfg(test)]
mod tests_rotation;

pub use answers::{
    BuzzerOutcome, BuzzerResult, DomainAnswerSummary, PendingBuzzerAnswer, Submission, TeamAnswer,
    Verdict,
};
pub use deadline::{Clock, Deadline, SystemClock};
pub use rules::whole_pass_quota;
pub use scoring::{buzzer_award, buzzer_penalty, domain_points, settle_buzz_sequence};
pub use state::{next_index, next_unattempted, Phase, QuizStatus, RoundKind};
