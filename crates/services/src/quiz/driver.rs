use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use trivia_core::model::{OptionTag, Question, ScoreRecord};
use trivia_core::session::{Advance, AnswerOutcome, Completion, SessionStateError};

use super::service::{ActiveQuiz, QuizService};
use crate::error::QuizError;

const TICK: Duration = Duration::from_secs(1);

/// Progress notifications emitted while a quiz runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    QuestionShown {
        index: usize,
        total: usize,
        question: Question,
        seconds: u32,
    },
    Tick {
        remaining: u32,
    },
    Answered(AnswerOutcome),
    Completed {
        completion: Completion,
        saved: bool,
    },
    Abandoned,
}

/// How a driven quiz ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
    Completed {
        completion: Completion,
        record: Option<ScoreRecord>,
    },
    Abandoned,
}

/// Runs one quiz in real time: a one-second countdown per question, answers
/// from a channel, a feedback pause after each lock.
///
/// Dropping the answer sender abandons the quiz; nothing is saved.
#[derive(Clone)]
pub struct QuizDriver {
    service: QuizService,
}

impl QuizDriver {
    #[must_use]
    pub fn new(service: QuizService) -> Self {
        Self { service }
    }

    /// Drive `quiz` to completion or abandonment.
    ///
    /// Event delivery is best effort; a dropped event receiver does not stop
    /// the quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` only for state machine misuse. Score write
    /// failures are logged and reported through `DriverOutcome::Completed`
    /// with no record.
    pub async fn run(
        &self,
        mut quiz: ActiveQuiz,
        mut answers: mpsc::Receiver<OptionTag>,
        events: mpsc::UnboundedSender<QuizEvent>,
    ) -> Result<DriverOutcome, QuizError> {
        let emit = |event: QuizEvent| {
            let _ = events.send(event);
        };
        let feedback_delay = self.service.settings().feedback_delay();

        let mut ticker = time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let session = quiz.session();
            let Some(question) = session.current_question() else {
                return Err(QuizError::Session(SessionStateError::InvalidState {
                    action: "show a question",
                    phase: session.phase().name(),
                }));
            };
            emit(QuizEvent::QuestionShown {
                index: session.current_index(),
                total: session.questions().len(),
                question: question.clone(),
                seconds: session.time_remaining(),
            });
            ticker.reset();

            let outcome = loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(outcome) = quiz.tick() {
                            break outcome;
                        }
                        emit(QuizEvent::Tick { remaining: quiz.session().time_remaining() });
                    }
                    answer = answers.recv() => {
                        let Some(option) = answer else {
                            return Ok(abandon(&quiz, &emit));
                        };
                        match quiz.answer(option) {
                            Ok(outcome) => break outcome,
                            Err(err) => tracing::debug!(error = %err, "answer ignored"),
                        }
                    }
                }
            };
            emit(QuizEvent::Answered(outcome));

            let pause = time::sleep(feedback_delay);
            tokio::pin!(pause);
            loop {
                tokio::select! {
                    () = &mut pause => break,
                    answer = answers.recv() => {
                        if answer.is_none() {
                            return Ok(abandon(&quiz, &emit));
                        }
                        tracing::debug!("answer ignored while question is locked");
                    }
                }
            }

            match self.service.advance(&mut quiz).await? {
                Advance::Next { .. } => {}
                Advance::Complete(completion) => {
                    let record = quiz.saved_score().cloned();
                    emit(QuizEvent::Completed {
                        completion,
                        saved: record.is_some(),
                    });
                    return Ok(DriverOutcome::Completed { completion, record });
                }
            }
        }
    }
}

fn abandon(quiz: &ActiveQuiz, emit: &impl Fn(QuizEvent)) -> DriverOutcome {
    tracing::info!(
        user_id = %quiz.viewer().user_id(),
        answered = quiz.session().progress().answered,
        "quiz abandoned"
    );
    emit(QuizEvent::Abandoned);
    DriverOutcome::Abandoned
}
