//! Error handling for the quiz engine.

pub mod domain;
pub mod reject;

pub use domain::DomainError;
pub use reject::RejectReason;
