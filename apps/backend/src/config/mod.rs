//! Environment-driven configuration.

pub mod timers;

pub use timers::TimerConfig;
