use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use storage::repository::{CategoryRepository, QuestionRepository, ScoreFilter, ScoreRepository};
use trivia_core::model::{Category, CategoryId, NewScore, OptionTag, ScoreRecord};
use trivia_core::session::{
    Advance, AnswerOutcome, QuizSession, SessionPhase, SessionSettings, SessionStateError,
};

use crate::Clock;
use crate::error::QuizError;
use crate::identity::Viewer;
use crate::policy::CallPolicy;

//
// ─── ACTIVE QUIZ ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum SaveState {
    Pending,
    Saved(ScoreRecord),
    Failed,
}

/// A session bound to the player who started it.
///
/// Tracks whether the final score has been written so a completed attempt is
/// persisted at most once.
#[derive(Debug, Clone)]
pub struct ActiveQuiz {
    viewer: Viewer,
    session: QuizSession,
    save: SaveState,
}

impl ActiveQuiz {
    #[must_use]
    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// The stored score row, once the completed attempt has been saved.
    #[must_use]
    pub fn saved_score(&self) -> Option<&ScoreRecord> {
        match &self.save {
            SaveState::Saved(record) => Some(record),
            _ => None,
        }
    }

    /// True once a save has been attempted, successful or not.
    #[must_use]
    pub fn save_attempted(&self) -> bool {
        !matches!(self.save, SaveState::Pending)
    }

    /// Lock the current question with the player's choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the question is already locked or the
    /// quiz is not running.
    pub fn answer(&mut self, option: OptionTag) -> Result<AnswerOutcome, QuizError> {
        Ok(self.session.submit_answer(option)?)
    }

    /// One second of countdown; yields the timed-out outcome when time runs out.
    pub fn tick(&mut self) -> Option<AnswerOutcome> {
        self.session.tick()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates category selection, question loading and score persistence.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    settings: SessionSettings,
    policy: CallPolicy,
    categories: Arc<dyn CategoryRepository>,
    questions: Arc<dyn QuestionRepository>,
    scores: Arc<dyn ScoreRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        categories: Arc<dyn CategoryRepository>,
        questions: Arc<dyn QuestionRepository>,
        scores: Arc<dyn ScoreRepository>,
    ) -> Self {
        Self {
            clock,
            settings: SessionSettings::default(),
            policy: CallPolicy::default(),
            categories,
            questions,
            scores,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Categories the viewer has not played yet, ordered by id.
    ///
    /// If the viewer's history cannot be read every category is offered.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the category list cannot be loaded.
    pub async fn available_categories(&self, viewer: &Viewer) -> Result<Vec<Category>, QuizError> {
        let categories = self
            .policy
            .run("list_categories", self.categories.list_categories())
            .await?;

        let filter = ScoreFilter::all().for_user(viewer.user_id());
        let played: HashSet<CategoryId> = self
            .policy
            .run_or("list_scores", self.scores.list_scores(filter), Vec::new())
            .await
            .into_iter()
            .filter_map(|row| row.category_id)
            .collect();

        Ok(categories
            .into_iter()
            .filter(|c| !played.contains(&c.id()))
            .collect())
    }

    /// Whether a score row already exists for this viewer and category.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the score store cannot be read.
    pub async fn has_played(
        &self,
        viewer: &Viewer,
        category_id: CategoryId,
    ) -> Result<bool, QuizError> {
        let filter = ScoreFilter::all()
            .for_user(viewer.user_id())
            .in_category(category_id);
        let rows = self
            .policy
            .run("list_scores", self.scores.list_scores(filter))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Start a quiz on `category_id`: check eligibility, fetch the pool and
    /// sample it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::CategoryNotFound` or `QuizError::AlreadyPlayed` if
    /// the category cannot be started, and `QuizError::Unavailable` when the
    /// question fetch fails or the category has no questions.
    pub async fn start<R: Rng + ?Sized>(
        &self,
        viewer: &Viewer,
        category_id: CategoryId,
        rng: &mut R,
    ) -> Result<ActiveQuiz, QuizError> {
        self.policy
            .run("get_category", self.categories.get_category(category_id))
            .await?
            .ok_or(QuizError::CategoryNotFound)?;

        if self.has_played(viewer, category_id).await? {
            return Err(QuizError::AlreadyPlayed);
        }

        let mut session = QuizSession::new(self.settings);
        session.select_category(category_id)?;

        let fetched = self
            .policy
            .run("list_questions", self.questions.list_questions(category_id))
            .await;
        let pool = match fetched {
            Ok(pool) => pool,
            Err(err) => {
                tracing::warn!(category_id = %category_id, error = %err, "question fetch failed");
                session.fail_loading(err.to_string())?;
                return Err(unavailable(&session));
            }
        };

        match session.load_questions(pool, rng) {
            Ok(count) => {
                tracing::info!(
                    user_id = %viewer.user_id(),
                    category_id = %category_id,
                    questions = count,
                    "quiz started"
                );
            }
            Err(SessionStateError::NoQuestions) => return Err(unavailable(&session)),
            Err(err) => return Err(err.into()),
        }

        Ok(ActiveQuiz {
            viewer: viewer.clone(),
            session,
            save: SaveState::Pending,
        })
    }

    /// Leave the locked question. On the last question this completes the
    /// quiz and saves the score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` unless the current question is locked.
    /// A failed score write is logged, not returned.
    pub async fn advance(&self, quiz: &mut ActiveQuiz) -> Result<Advance, QuizError> {
        let step = quiz.session.advance(self.clock.now())?;
        if matches!(step, Advance::Complete(_)) {
            self.save_score(quiz).await?;
        }
        Ok(step)
    }

    /// Write the completed attempt's score row. Only the first call writes;
    /// later calls return what the first one produced.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the quiz is not complete, or
    /// `QuizError::Score` if the final numbers cannot form a score row.
    pub async fn save_score(
        &self,
        quiz: &mut ActiveQuiz,
    ) -> Result<Option<ScoreRecord>, QuizError> {
        if quiz.save_attempted() {
            return Ok(quiz.saved_score().cloned());
        }

        let completion = quiz
            .session
            .completion()
            .ok_or_else(|| SessionStateError::InvalidState {
                action: "save the score",
                phase: quiz.session.phase().name(),
            })?;

        let new = NewScore::new(
            quiz.viewer.user_id(),
            quiz.viewer.email(),
            completion.category_id,
            completion.score,
            completion.total_questions,
            completion.completed_at,
        )?;

        quiz.save = match self
            .policy
            .run("append_score", self.scores.append_score(&new))
            .await
        {
            Ok(record) => {
                tracing::info!(
                    user_id = %quiz.viewer.user_id(),
                    category_id = %completion.category_id,
                    score = completion.score,
                    total = completion.total_questions,
                    "score saved"
                );
                SaveState::Saved(record)
            }
            Err(err) => {
                tracing::error!(
                    user_id = %quiz.viewer.user_id(),
                    category_id = %completion.category_id,
                    error = %err,
                    "failed to save score"
                );
                SaveState::Failed
            }
        };

        Ok(quiz.saved_score().cloned())
    }

    /// Look up a single category.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on backend failures.
    pub async fn category(&self, category_id: CategoryId) -> Result<Option<Category>, QuizError> {
        Ok(self
            .policy
            .run("get_category", self.categories.get_category(category_id))
            .await?)
    }
}

fn unavailable(session: &QuizSession) -> QuizError {
    match session.phase() {
        SessionPhase::Unavailable(reason) => QuizError::Unavailable(reason.clone()),
        other => QuizError::Session(SessionStateError::InvalidState {
            action: "load questions",
            phase: other.name(),
        }),
    }
}
