mod driver;
mod service;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use driver::{DriverOutcome, QuizDriver, QuizEvent};
pub use service::{ActiveQuiz, QuizService};
