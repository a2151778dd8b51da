//! Timer windows, overridable from the environment.

use std::env;

use time::Duration;

use crate::domain::rules;
use crate::errors::DomainError;

/// The four phase deadlines the engine arms. Defaults come from the
/// competition rules; each can be overridden with a `QUIZ_*_SECS` variable
/// for rehearsals and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// Window to answer a freshly selected domain question.
    pub domain_answer: Duration,
    /// Window to answer a question received via a pass.
    pub passed_answer: Duration,
    /// Window for teams to buzz once a buzzer question opens.
    pub buzz_window: Duration,
    /// Personal window to answer after buzzing.
    pub buzzer_answer: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            domain_answer: Duration::seconds(rules::DOMAIN_ANSWER_SECS),
            passed_answer: Duration::seconds(rules::PASSED_ANSWER_SECS),
            buzz_window: Duration::seconds(rules::BUZZ_WINDOW_SECS),
            buzzer_answer: Duration::seconds(rules::BUZZER_ANSWER_SECS),
        }
    }
}

impl TimerConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        let defaults = Self::default();
        Ok(Self {
            domain_answer: secs_var("QUIZ_DOMAIN_ANSWER_SECS", defaults.domain_answer)?,
            passed_answer: secs_var("QUIZ_PASSED_ANSWER_SECS", defaults.passed_answer)?,
            buzz_window: secs_var("QUIZ_BUZZ_WINDOW_SECS", defaults.buzz_window)?,
            buzzer_answer: secs_var("QUIZ_BUZZER_ANSWER_SECS", defaults.buzzer_answer)?,
        })
    }
}

fn secs_var(name: &str, default: Duration) -> Result<Duration, DomainError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::seconds)
            .ok_or_else(|| {
                DomainError::config(format!(
                    "{name} must be a positive whole number of seconds, got '{raw}'"
                ))
            }),
        Err(_) => Ok(default),
    }
}
