use std::sync::Arc;

use storage::repository::Storage;
use trivia_core::session::SessionSettings;

use crate::Clock;
use crate::admin::AdminService;
use crate::error::AppServicesError;
use crate::leaderboard_service::LeaderboardService;
use crate::policy::CallPolicy;
use crate::quiz::{QuizDriver, QuizService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    policy: CallPolicy,
    quiz: Arc<QuizService>,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: SessionSettings,
        policy: CallPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, settings, policy))
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        settings: SessionSettings,
        policy: CallPolicy,
    ) -> Self {
        let quiz = Arc::new(
            QuizService::new(
                clock,
                Arc::clone(&storage.categories),
                Arc::clone(&storage.questions),
                Arc::clone(&storage.scores),
            )
            .with_settings(settings)
            .with_policy(policy),
        );
        let leaderboard =
            Arc::new(LeaderboardService::new(Arc::clone(&storage.scores)).with_policy(policy));

        Self {
            storage,
            policy,
            quiz,
            leaderboard,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn quiz_driver(&self) -> QuizDriver {
        QuizDriver::new(self.quiz.as_ref().clone())
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }

    /// A fresh admin surface; call `refresh` to fill its catalog.
    #[must_use]
    pub fn admin(&self) -> AdminService {
        AdminService::new(
            Arc::clone(&self.storage.categories),
            Arc::clone(&self.storage.questions),
        )
        .with_policy(self.policy)
    }
}
