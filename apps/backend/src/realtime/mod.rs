//! State-change notifications to connected viewers.

pub mod broadcast;
pub mod events;
pub mod notifier;

pub use broadcast::BroadcastNotifier;
pub use events::EventEnvelope;
pub use notifier::QuizNotifier;
