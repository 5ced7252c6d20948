use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSettingsError {
    #[error("max questions per session must be > 0")]
    InvalidMaxQuestions,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,

    #[error("feedback delay must be between 1000 and 1500 ms")]
    InvalidFeedbackDelay,
}

/// Tunables for one quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    max_questions: u32,
    seconds_per_question: u32,
    feedback_delay: Duration,
}

impl SessionSettings {
    pub const DEFAULT_MAX_QUESTIONS: u32 = 5;
    pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;
    pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 1500;

    /// Creates custom session settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a count is zero or the feedback delay falls outside
    /// 1000..=1500 ms.
    pub fn new(
        max_questions: u32,
        seconds_per_question: u32,
        feedback_delay_ms: u64,
    ) -> Result<Self, SessionSettingsError> {
        if max_questions == 0 {
            return Err(SessionSettingsError::InvalidMaxQuestions);
        }
        if seconds_per_question == 0 {
            return Err(SessionSettingsError::InvalidSecondsPerQuestion);
        }
        if !(1000..=1500).contains(&feedback_delay_ms) {
            return Err(SessionSettingsError::InvalidFeedbackDelay);
        }
        Ok(Self {
            max_questions,
            seconds_per_question,
            feedback_delay: Duration::from_millis(feedback_delay_ms),
        })
    }

    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    /// Pause between locking an answer and moving on.
    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_questions: Self::DEFAULT_MAX_QUESTIONS,
            seconds_per_question: Self::DEFAULT_SECONDS_PER_QUESTION,
            feedback_delay: Duration::from_millis(Self::DEFAULT_FEEDBACK_DELAY_MS),
        }
    }
}
