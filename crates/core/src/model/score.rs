use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CategoryId, ScoreId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("a quiz attempt must contain at least one question")]
    NoQuestions,

    #[error("score {score} exceeds total questions {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// A completed quiz attempt, ready to be appended to the score store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    user_id: UserId,
    user_email: String,
    category_id: CategoryId,
    score: u32,
    total_questions: u32,
    created_at: DateTime<Utc>,
}

impl NewScore {
    /// Build a score for a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` when `total_questions` is zero and
    /// `ScoreError::ScoreExceedsTotal` when `score > total_questions`.
    pub fn new(
        user_id: UserId,
        user_email: impl Into<String>,
        category_id: CategoryId,
        score: u32,
        total_questions: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        if total_questions == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if score > total_questions {
            return Err(ScoreError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            user_id,
            user_email: user_email.into(),
            category_id,
            score,
            total_questions,
            created_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attach the id assigned by storage.
    #[must_use]
    pub fn into_record(self, id: ScoreId) -> ScoreRecord {
        let email = if self.user_email.trim().is_empty() {
            None
        } else {
            Some(self.user_email)
        };
        ScoreRecord {
            id,
            user_id: Some(self.user_id),
            user_email: email,
            category_id: Some(self.category_id),
            score: self.score,
            total_questions: self.total_questions,
            created_at: self.created_at,
        }
    }
}

/// One persisted outcome of a completed quiz attempt.
///
/// User and category references are optional: rows read back from storage may
/// have lost either link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub category_id: Option<CategoryId>,
    pub score: u32,
    pub total_questions: u32,
    pub created_at: DateTime<Utc>,
}
