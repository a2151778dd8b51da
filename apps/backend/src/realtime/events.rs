use serde::{Deserialize, Serialize};

use crate::domain::state::QuizId;

/// Envelope pushed to viewers after a successful mutation.
///
/// Deliberately carries no quiz state: consumers re-fetch through their read
/// path, and the version lets them drop notifications that arrive out of
/// order or duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    QuizStateAvailable { quiz_id: QuizId, version: i32 },
}
