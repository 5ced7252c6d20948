use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use thiserror::Error;

use super::sample::sample_questions;
use super::settings::SessionSettings;
use crate::model::{CategoryId, OptionTag, Question, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("cannot {action} while the session is {phase}")]
    InvalidState {
        action: &'static str,
        phase: &'static str,
    },

    #[error("this question has already been answered")]
    AlreadyAnswered,

    #[error("no questions available for this category yet")]
    NoQuestions,
}

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Why a chosen category cannot be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    NoQuestions,
    FetchFailed(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NoQuestions => f.write_str(
                "No questions available for this category yet. Please check back later!",
            ),
            Unavailable::FetchFailed(reason) => write!(f, "Failed to load questions: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No category chosen.
    Idle,
    /// Category chosen, questions not yet delivered.
    Loading,
    /// Category chosen but not playable; only `reset` leaves this phase.
    Unavailable(Unavailable),
    /// Current question is open and its countdown is running.
    InProgress,
    /// Current question is locked; waiting for `advance`.
    Answered,
    /// Every sampled question has been answered.
    Complete,
}

impl SessionPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::Unavailable(_) => "unavailable",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Answered => "answered",
            SessionPhase::Complete => "complete",
        }
    }
}

/// How a question was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Selected(OptionTag),
    TimedOut,
}

/// Feedback for a locked question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub answer: AnswerKind,
    pub correct_option: OptionTag,
    pub is_correct: bool,
    /// Running score after this answer.
    pub score: u32,
}

/// Final numbers of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub category_id: CategoryId,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

/// Result of leaving the `Answered` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Complete(Completion),
}

/// Aggregated view of session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed playthrough of up to `max_questions` questions of a category.
#[derive(Clone)]
pub struct QuizSession {
    settings: SessionSettings,
    phase: SessionPhase,
    category_id: Option<CategoryId>,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    time_remaining: u32,
    last_outcome: Option<AnswerOutcome>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            phase: SessionPhase::Idle,
            category_id: None,
            questions: Vec::new(),
            current: 0,
            score: 0,
            time_remaining: settings.seconds_per_question(),
            last_outcome: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen, while a question is open or locked.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress | SessionPhase::Answered => self.questions.get(self.current),
            _ => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        // Bounded by `max_questions`, which is a u32.
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.phase, SessionPhase::Answered)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, SessionPhase::Complete)
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<&AnswerOutcome> {
        self.last_outcome.as_ref()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = match self.phase {
            SessionPhase::Answered => self.current + 1,
            SessionPhase::Complete => self.questions.len(),
            _ => self.current,
        };
        SessionProgress {
            total: self.questions.len(),
            answered,
            remaining: self.questions.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Final numbers, once the session is complete.
    #[must_use]
    pub fn completion(&self) -> Option<Completion> {
        if !self.is_complete() {
            return None;
        }
        Some(Completion {
            category_id: self.category_id?,
            score: self.score,
            total_questions: self.total_questions(),
            completed_at: self.completed_at?,
        })
    }

    /// `Idle → Loading`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidState` unless the session is idle.
    pub fn select_category(&mut self, category_id: CategoryId) -> Result<(), SessionStateError> {
        self.expect_phase(&SessionPhase::Idle, "choose a category")?;
        self.category_id = Some(category_id);
        self.phase = SessionPhase::Loading;
        Ok(())
    }

    /// `Loading → InProgress`, sampling from the category's full pool.
    ///
    /// Returns the number of questions sampled.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NoQuestions` (and moves to
    /// `Unavailable(NoQuestions)`) when the pool is empty, or
    /// `SessionStateError::InvalidState` when not loading.
    pub fn load_questions<R: Rng + ?Sized>(
        &mut self,
        pool: Vec<Question>,
        rng: &mut R,
    ) -> Result<usize, SessionStateError> {
        self.expect_phase(&SessionPhase::Loading, "load questions")?;

        let limit = usize::try_from(self.settings.max_questions()).unwrap_or(usize::MAX);
        let sampled = sample_questions(pool, limit, rng);
        if sampled.is_empty() {
            self.phase = SessionPhase::Unavailable(Unavailable::NoQuestions);
            return Err(SessionStateError::NoQuestions);
        }

        self.questions = sampled;
        self.current = 0;
        self.score = 0;
        self.last_outcome = None;
        self.completed_at = None;
        self.time_remaining = self.settings.seconds_per_question();
        self.phase = SessionPhase::InProgress;
        Ok(self.questions.len())
    }

    /// `Loading → Unavailable(FetchFailed)`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidState` when not loading.
    pub fn fail_loading(&mut self, reason: impl Into<String>) -> Result<(), SessionStateError> {
        self.expect_phase(&SessionPhase::Loading, "report a loading failure")?;
        self.phase = SessionPhase::Unavailable(Unavailable::FetchFailed(reason.into()));
        Ok(())
    }

    /// `InProgress → Answered` by the player's choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyAnswered` if the current question is
    /// locked (the score is left untouched), or `InvalidState` outside play.
    pub fn submit_answer(&mut self, option: OptionTag) -> Result<AnswerOutcome, SessionStateError> {
        match self.phase {
            SessionPhase::InProgress => Ok(self.lock(AnswerKind::Selected(option))),
            SessionPhase::Answered => Err(SessionStateError::AlreadyAnswered),
            _ => Err(self.invalid("answer")),
        }
    }

    /// One countdown step. Forces `Answered` with no point when time runs out.
    ///
    /// Ticks outside `InProgress` are ignored.
    pub fn tick(&mut self) -> Option<AnswerOutcome> {
        if !matches!(self.phase, SessionPhase::InProgress) {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            return Some(self.lock(AnswerKind::TimedOut));
        }
        None
    }

    /// `Answered → InProgress` on the next question, or `Answered → Complete`
    /// after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidState` unless the current question
    /// is locked.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionStateError> {
        self.expect_phase(&SessionPhase::Answered, "advance")?;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.time_remaining = self.settings.seconds_per_question();
            self.phase = SessionPhase::InProgress;
            return Ok(Advance::Next {
                index: self.current,
            });
        }

        self.phase = SessionPhase::Complete;
        self.completed_at = Some(now);
        self.completion()
            .map(Advance::Complete)
            .ok_or_else(|| self.invalid("complete"))
    }

    /// Discard everything and return to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }

    fn lock(&mut self, answer: AnswerKind) -> AnswerOutcome {
        let question = &self.questions[self.current];
        let question_id = question.id();
        let correct_option = question.correct_option();
        let is_correct = matches!(answer, AnswerKind::Selected(tag) if tag == correct_option);
        if is_correct {
            self.score += 1;
        }
        let outcome = AnswerOutcome {
            question_id,
            answer,
            correct_option,
            is_correct,
            score: self.score,
        };
        self.phase = SessionPhase::Answered;
        self.last_outcome = Some(outcome);
        outcome
    }

    fn expect_phase(
        &self,
        expected: &SessionPhase,
        action: &'static str,
    ) -> Result<(), SessionStateError> {
        if &self.phase == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionStateError {
        SessionStateError::InvalidState {
            action,
            phase: self.phase.name(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("category_id", &self.category_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("time_remaining", &self.time_remaining)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: u64, correct: OptionTag) -> Question {
        QuestionDraft {
            category_id: Some(CategoryId::new(1)),
            text: format!("Q{id}"),
            option_a: "a".into(),
            option_b: "b".into(),
            option_c: "c".into(),
            option_d: "d".into(),
            correct_option: correct,
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    fn pool(n: u64) -> Vec<Question> {
        (1..=n).map(|id| question(id, OptionTag::B)).collect()
    }

    fn started(n: u64) -> QuizSession {
        let mut session = QuizSession::new(SessionSettings::default());
        session.select_category(CategoryId::new(1)).unwrap();
        session
            .load_questions(pool(n), &mut StdRng::seed_from_u64(42))
            .unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = QuizSession::new(SessionSettings::default());
        assert_eq!(session.phase(), &SessionPhase::Idle);
        assert!(session.current_question().is_none());
        assert_eq!(session.time_remaining(), 30);
    }

    #[test]
    fn small_category_uses_every_question() {
        let session = started(3);
        assert_eq!(session.total_questions(), 3);
        assert_eq!(session.phase(), &SessionPhase::InProgress);
    }

    #[test]
    fn large_category_is_capped_at_five() {
        let session = started(12);
        assert_eq!(session.total_questions(), 5);
    }

    #[test]
    fn empty_category_is_unavailable() {
        let mut session = QuizSession::new(SessionSettings::default());
        session.select_category(CategoryId::new(1)).unwrap();
        let err = session
            .load_questions(Vec::new(), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(err, SessionStateError::NoQuestions);
        assert_eq!(
            session.phase(),
            &SessionPhase::Unavailable(Unavailable::NoQuestions)
        );
        assert!(session.submit_answer(OptionTag::A).is_err());
    }

    #[test]
    fn fetch_failure_is_unavailable_until_reset() {
        let mut session = QuizSession::new(SessionSettings::default());
        session.select_category(CategoryId::new(1)).unwrap();
        session.fail_loading("network down").unwrap();
        assert!(matches!(
            session.phase(),
            SessionPhase::Unavailable(Unavailable::FetchFailed(_))
        ));
        assert!(session.select_category(CategoryId::new(2)).is_err());

        session.reset();
        assert_eq!(session.phase(), &SessionPhase::Idle);
        session.select_category(CategoryId::new(2)).unwrap();
    }

    #[test]
    fn correct_answer_scores_immediately() {
        let mut session = started(3);
        session.tick();
        let outcome = session.submit_answer(OptionTag::B).unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.score, 1);
        assert_eq!(session.score(), 1);
        assert_eq!(session.phase(), &SessionPhase::Answered);
        assert_eq!(session.time_remaining(), 29);
    }

    #[test]
    fn wrong_answer_scores_nothing() {
        let mut session = started(3);
        let outcome = session.submit_answer(OptionTag::D).unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_option, OptionTag::B);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn locked_question_ignores_further_answers() {
        let mut session = started(3);
        session.submit_answer(OptionTag::B).unwrap();
        for tag in OptionTag::ALL {
            assert_eq!(
                session.submit_answer(tag).unwrap_err(),
                SessionStateError::AlreadyAnswered
            );
        }
        assert!(session.tick().is_none());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn timeout_locks_without_point_then_advances() {
        let mut session = started(2);
        let mut outcome = None;
        for _ in 0..30 {
            outcome = session.tick();
        }
        let outcome = outcome.expect("timer should expire on the 30th tick");
        assert_eq!(outcome.answer, AnswerKind::TimedOut);
        assert!(!outcome.is_correct);
        assert_eq!(session.score(), 0);
        assert_eq!(session.phase(), &SessionPhase::Answered);

        assert_eq!(
            session.advance(fixed_now()).unwrap(),
            Advance::Next { index: 1 }
        );
        assert_eq!(session.time_remaining(), 30);
        assert_eq!(session.phase(), &SessionPhase::InProgress);
    }

    #[test]
    fn advance_requires_locked_question() {
        let mut session = started(2);
        assert!(matches!(
            session.advance(fixed_now()).unwrap_err(),
            SessionStateError::InvalidState { .. }
        ));
    }

    #[test]
    fn last_answer_completes_session() {
        let mut session = started(2);
        session.submit_answer(OptionTag::B).unwrap();
        session.advance(fixed_now()).unwrap();
        session.submit_answer(OptionTag::A).unwrap();
        let Advance::Complete(completion) = session.advance(fixed_now()).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(completion.score, 1);
        assert_eq!(completion.total_questions, 2);
        assert_eq!(completion.category_id, CategoryId::new(1));
        assert!(session.is_complete());
        assert_eq!(session.completion(), Some(completion));
        assert!(session.submit_answer(OptionTag::B).is_err());
    }

    #[test]
    fn progress_tracks_answers() {
        let mut session = started(3);
        assert_eq!(session.progress().answered, 0);
        session.submit_answer(OptionTag::A).unwrap();
        let progress = session.progress();
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete);
    }

    #[test]
    fn final_score_never_exceeds_total() {
        for seed in 0..64_u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut session = QuizSession::new(SessionSettings::default());
            session.select_category(CategoryId::new(1)).unwrap();
            session.load_questions(pool(seed % 7 + 1), &mut rng).unwrap();
            while !session.is_complete() {
                let tag = OptionTag::ALL[rng.random_range(0..4)];
                if rng.random_bool(0.2) {
                    while session.tick().is_none() {}
                } else {
                    session.submit_answer(tag).unwrap();
                }
                let _ = session.submit_answer(tag);
                session.advance(fixed_now()).unwrap();
            }
            let completion = session.completion().unwrap();
            assert!(completion.score <= completion.total_questions);
        }
    }
}
