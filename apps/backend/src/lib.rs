#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Orchestration engine for live multi-team trivia competitions: a
//! two-format state machine (domain selections with pass-around answering,
//! then a buzzer race) driven by host and team actions plus stateless
//! deadline polling.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod realtime;
pub mod repos;
pub mod services;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use adapters::memory::InMemoryStore;
pub use config::TimerConfig;
pub use domain::answers::Verdict;
pub use domain::deadline::{Clock, Deadline, SystemClock};
pub use domain::state::{Phase, QuizStatus, RoundKind};
pub use errors::{DomainError, RejectReason};
pub use realtime::{BroadcastNotifier, EventEnvelope, QuizNotifier};
pub use repos::store::QuizStore;
pub use services::quiz_flow::{ActionOutcome, QuizFlowService, QuizLocks, TickOutcome};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
