//! Storage-facing domain models and the `QuizStore` contract.

pub mod buzzer_questions;
pub mod questions;
pub mod quizzes;
pub mod store;
pub mod teams;

pub use buzzer_questions::BuzzerQuestion;
pub use questions::{Domain, Question, QuestionUpdate};
pub use quizzes::{Quiz, QuizUpdate};
pub use store::QuizStore;
pub use teams::{team_ids, Team};
