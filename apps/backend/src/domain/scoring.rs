//! Scoring tables and pure settlement over buzz state.

use std::collections::BTreeMap;

use crate::domain::answers::{BuzzerOutcome, BuzzerResult, PendingBuzzerAnswer, Verdict};
use crate::domain::state::TeamId;

/// Points for a host-evaluated domain answer.
///
/// Answering without the options is the high-risk/high-reward path: full
/// points when correct, no penalty when wrong (the question passes on
/// instead). Once the options are visible the stakes halve and a wrong
/// answer costs points.
pub fn domain_points(verdict: Verdict, with_options: bool) -> i32 {
    match (verdict, with_options) {
        (Verdict::Correct, false) => 10,
        (Verdict::Correct, true) => 5,
        (Verdict::Incorrect, false) => 0,
        (Verdict::Incorrect, true) => -5,
    }
}

/// Award for a correct buzzer answer. The first buzzer risked more, so a
/// correct answer from anyone later earns half.
pub fn buzzer_award(is_first: bool) -> i32 {
    if is_first {
        10
    } else {
        5
    }
}

/// Penalty for a wrong or timed-out buzzer answer, mirroring the award.
pub fn buzzer_penalty(is_first: bool) -> i32 {
    if is_first {
        -10
    } else {
        -5
    }
}

/// Walks the buzz sequence in order and settles every team's outcome.
///
/// Teams with no queued answer, or a queued answer the host never marked,
/// are penalized as timeouts. The first `Correct` verdict ends the walk:
/// every team behind it is `NotReached` with zero points. Pure over its
/// inputs, so settlement is deterministic given the same buzz state.
pub fn settle_buzz_sequence(
    buzz_sequence: &[TeamId],
    pending: &BTreeMap<TeamId, PendingBuzzerAnswer>,
) -> Vec<BuzzerResult> {
    let mut results = Vec::with_capacity(buzz_sequence.len());
    let mut answered_correctly = false;
    for (position, &team_id) in buzz_sequence.iter().enumerate() {
        let is_first = position == 0;
        let queued = pending.get(&team_id);
        let answer = queued.map(|a| a.answer.clone()).unwrap_or_default();
        let (outcome, points) = if answered_correctly {
            (BuzzerOutcome::NotReached, 0)
        } else {
            match queued.and_then(|a| a.verdict) {
                Some(Verdict::Correct) => {
                    answered_correctly = true;
                    (BuzzerOutcome::Correct, buzzer_award(is_first))
                }
                Some(Verdict::Incorrect) => (BuzzerOutcome::Incorrect, buzzer_penalty(is_first)),
                None => (BuzzerOutcome::Timeout, buzzer_penalty(is_first)),
            }
        };
        results.push(BuzzerResult {
            team_id,
            answer,
            outcome,
            points,
        });
    }
    results
}
