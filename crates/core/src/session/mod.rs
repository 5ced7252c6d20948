//! Quiz session state machine.
//!
//! A [`QuizSession`] is created idle, pointed at a category, fed the
//! category's question pool and then stepped by answers, countdown ticks and
//! explicit advances until it completes. It never performs I/O: the caller
//! supplies questions, randomness and timestamps.

mod sample;
mod settings;
mod state;

pub use sample::sample_questions;
pub use settings::{SessionSettings, SessionSettingsError};
pub use state::{
    Advance, AnswerKind, AnswerOutcome, Completion, QuizSession, SessionPhase, SessionProgress,
    SessionStateError, Unavailable,
};
