//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use trivia_core::model::{CategoryError, QuestionError, ScoreError};
use trivia_core::session::{SessionStateError, Unavailable};

/// Errors emitted by the quiz flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("category not found")]
    CategoryNotFound,
    #[error("you have already played this category")]
    AlreadyPlayed,
    #[error("{0}")]
    Unavailable(Unavailable),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error("failed to load scores: {0}")]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminError {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
