//! Orchestration services.

pub mod quiz_flow;

pub use quiz_flow::{ActionOutcome, QuizFlowService, TickOutcome};
