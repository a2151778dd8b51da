use crate::domain::state::{QuestionId, QuizId};

/// A buzzer-round question. Played strictly in `number` order; `is_answered`
/// marks it consumed whether or not anyone scored on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzerQuestion {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub number: u32,
    pub text: String,
    pub answer: String,
    pub is_answered: bool,
}
