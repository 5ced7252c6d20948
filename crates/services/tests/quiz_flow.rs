use std::sync::Arc;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{
    ActiveQuiz, Clock, DriverOutcome, QuizDriver, QuizError, QuizEvent, QuizService, Viewer,
};
use storage::repository::{
    CategoryRepository, InMemoryRepository, QuestionRepository, ScoreFilter, ScoreRepository,
    Storage, StorageError,
};
use tokio::sync::mpsc;
use trivia_core::model::{
    CategoryId, CategoryName, NewScore, OptionTag, Question, QuestionDraft, ScoreRecord, UserId,
};
use trivia_core::session::{Advance, AnswerKind, SessionSettings, Unavailable};
use trivia_core::time::fixed_now;

struct DownScores;

#[async_trait]
impl ScoreRepository for DownScores {
    async fn append_score(&self, _score: &NewScore) -> Result<ScoreRecord, StorageError> {
        Err(StorageError::Connection("score store down".into()))
    }

    async fn list_scores(&self, _filter: ScoreFilter) -> Result<Vec<ScoreRecord>, StorageError> {
        Err(StorageError::Connection("score store down".into()))
    }
}

struct DownQuestions;

#[async_trait]
impl QuestionRepository for DownQuestions {
    async fn insert_question(
        &self,
        _question: trivia_core::model::ValidatedQuestion,
    ) -> Result<Question, StorageError> {
        Err(StorageError::Connection("question store down".into()))
    }

    async fn update_question(&self, _question: &Question) -> Result<(), StorageError> {
        Err(StorageError::Connection("question store down".into()))
    }

    async fn delete_question(
        &self,
        _id: trivia_core::model::QuestionId,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("question store down".into()))
    }

    async fn list_questions(
        &self,
        _category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Connection("question store down".into()))
    }

    async fn list_all_questions(&self) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Connection("question store down".into()))
    }
}

async fn seed_category(repo: &InMemoryRepository, name: &str, questions: u64) -> CategoryId {
    let category = repo
        .insert_category(&CategoryName::new(name).unwrap())
        .await
        .unwrap();
    for n in 1..=questions {
        let draft = QuestionDraft {
            category_id: Some(category.id()),
            text: format!("{name} question {n}?"),
            option_a: "one".into(),
            option_b: "two".into(),
            option_c: "three".into(),
            option_d: "four".into(),
            correct_option: OptionTag::ALL[(n % 4) as usize],
        };
        repo.insert_question(draft.validate().unwrap()).await.unwrap();
    }
    category.id()
}

fn quiz_service(storage: &Storage) -> QuizService {
    QuizService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.categories),
        Arc::clone(&storage.questions),
        Arc::clone(&storage.scores),
    )
}

fn viewer() -> Viewer {
    Viewer::new(UserId::random(), "player@example.com")
}

async fn play_all(service: &QuizService, quiz: &mut ActiveQuiz, correct: bool) -> Advance {
    loop {
        let question = quiz.session().current_question().unwrap().clone();
        let pick = if correct {
            question.correct_option()
        } else {
            OptionTag::ALL
                .into_iter()
                .find(|tag| *tag != question.correct_option())
                .unwrap()
        };
        quiz.answer(pick).unwrap();
        let step = service.advance(quiz).await.unwrap();
        if matches!(step, Advance::Complete(_)) {
            return step;
        }
    }
}

#[tokio::test]
async fn completed_quiz_saves_exactly_one_score() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 8).await;
    let storage = Storage::from_repository(repo.clone());
    let service = quiz_service(&storage);
    let player = viewer();
    let mut rng = StdRng::seed_from_u64(11);

    let mut quiz = service.start(&player, category, &mut rng).await.unwrap();
    assert_eq!(quiz.session().total_questions(), 5);

    let Advance::Complete(completion) = play_all(&service, &mut quiz, true).await else {
        panic!("expected completion");
    };
    assert_eq!(completion.score, 5);
    assert_eq!(completion.total_questions, 5);
    assert_eq!(completion.completed_at, fixed_now());

    let saved = quiz.saved_score().cloned().expect("score saved");
    assert_eq!(saved.user_id, Some(player.user_id()));
    assert_eq!(saved.user_email.as_deref(), Some("player@example.com"));
    assert_eq!(saved.category_id, Some(category));

    let again = service.save_score(&mut quiz).await.unwrap();
    assert_eq!(again, Some(saved));
    let rows = repo.list_scores(ScoreFilter::all()).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn played_categories_are_hidden_and_blocked() {
    let repo = InMemoryRepository::new();
    let science = seed_category(&repo, "Science", 3).await;
    let history = seed_category(&repo, "History", 3).await;
    let storage = Storage::from_repository(repo.clone());
    let service = quiz_service(&storage);
    let player = viewer();
    let mut rng = StdRng::seed_from_u64(5);

    let mut quiz = service.start(&player, science, &mut rng).await.unwrap();
    play_all(&service, &mut quiz, false).await;
    assert_eq!(quiz.saved_score().map(|s| s.score), Some(0));

    let offered: Vec<_> = service
        .available_categories(&player)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(offered, vec![history]);

    let err = service.start(&player, science, &mut rng).await.unwrap_err();
    assert!(matches!(err, QuizError::AlreadyPlayed));

    let stranger = viewer();
    assert_eq!(service.available_categories(&stranger).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unreadable_history_offers_every_category() {
    let repo = InMemoryRepository::new();
    seed_category(&repo, "Science", 1).await;
    seed_category(&repo, "History", 1).await;
    let mut storage = Storage::from_repository(repo);
    storage.scores = Arc::new(DownScores);
    let service = quiz_service(&storage);

    let offered = service.available_categories(&viewer()).await.unwrap();
    assert_eq!(offered.len(), 2);
}

#[tokio::test]
async fn empty_category_is_unavailable() {
    let repo = InMemoryRepository::new();
    let empty = seed_category(&repo, "Empty", 0).await;
    let storage = Storage::from_repository(repo);
    let service = quiz_service(&storage);
    let mut rng = StdRng::seed_from_u64(1);

    let err = service.start(&viewer(), empty, &mut rng).await.unwrap_err();
    assert!(matches!(err, QuizError::Unavailable(Unavailable::NoQuestions)));
}

#[tokio::test]
async fn failed_fetch_is_unavailable() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 2).await;
    let mut storage = Storage::from_repository(repo);
    storage.questions = Arc::new(DownQuestions);
    let service = quiz_service(&storage);
    let mut rng = StdRng::seed_from_u64(1);

    let err = service
        .start(&viewer(), category, &mut rng)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuizError::Unavailable(Unavailable::FetchFailed(ref reason))
            if reason.contains("question store down")
    ));
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let storage = Storage::in_memory();
    let service = quiz_service(&storage);
    let mut rng = StdRng::seed_from_u64(1);

    let err = service
        .start(&viewer(), CategoryId::new(77), &mut rng)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::CategoryNotFound));
}

#[tokio::test]
async fn failed_save_still_completes_the_quiz() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 2).await;
    let mut storage = Storage::from_repository(repo);
    storage.scores = Arc::new(DownScores);
    let service = quiz_service(&storage);
    let mut rng = StdRng::seed_from_u64(3);

    // Eligibility needs the score store, so start against a healthy one first.
    let healthy = quiz_service(&Storage {
        scores: Arc::new(InMemoryRepository::new()),
        ..storage.clone()
    });
    let mut quiz = healthy.start(&viewer(), category, &mut rng).await.unwrap();

    let Advance::Complete(completion) = play_all(&service, &mut quiz, true).await else {
        panic!("expected completion");
    };
    assert_eq!(completion.score, 2);
    assert!(quiz.session().is_complete());
    assert!(quiz.save_attempted());
    assert!(quiz.saved_score().is_none());
}

fn driver_fixture(storage: &Storage) -> QuizDriver {
    let settings = SessionSettings::new(3, 30, 1000).unwrap();
    QuizDriver::new(quiz_service(storage).with_settings(settings))
}

#[tokio::test(start_paused = true)]
async fn driver_runs_answered_quiz_to_completion() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 6).await;
    let storage = Storage::from_repository(repo.clone());
    let driver = driver_fixture(&storage);
    let mut rng = StdRng::seed_from_u64(9);
    let quiz = quiz_service(&storage)
        .with_settings(SessionSettings::new(3, 30, 1000).unwrap())
        .start(&viewer(), category, &mut rng)
        .await
        .unwrap();

    let (answer_tx, answer_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { driver.run(quiz, answer_rx, event_tx).await });

    let mut shown = 0;
    let mut answered = 0;
    while let Some(event) = event_rx.recv().await {
        match event {
            QuizEvent::QuestionShown {
                question, seconds, ..
            } => {
                shown += 1;
                assert_eq!(seconds, 30);
                answer_tx.send(question.correct_option()).await.unwrap();
            }
            QuizEvent::Answered(outcome) => {
                answered += 1;
                assert!(outcome.is_correct);
            }
            QuizEvent::Completed { saved, .. } => assert!(saved),
            QuizEvent::Tick { .. } | QuizEvent::Abandoned => {}
        }
    }

    let outcome = handle.await.unwrap().unwrap();
    let DriverOutcome::Completed { completion, record } = outcome else {
        panic!("expected completion");
    };
    assert_eq!((shown, answered), (3, 3));
    assert_eq!(completion.score, 3);
    assert_eq!(record.map(|r| r.score), Some(3));
    assert_eq!(repo.list_scores(ScoreFilter::all()).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn driver_times_out_silent_player() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 2).await;
    let storage = Storage::from_repository(repo.clone());
    let driver = driver_fixture(&storage);
    let mut rng = StdRng::seed_from_u64(2);
    let quiz = quiz_service(&storage)
        .start(&viewer(), category, &mut rng)
        .await
        .unwrap();

    let (answer_tx, answer_rx) = mpsc::channel::<OptionTag>(1);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let started = tokio::time::Instant::now();
    let outcome = driver.run(quiz, answer_rx, event_tx).await.unwrap();
    drop(answer_tx);

    let mut ticks = 0;
    let mut timeouts = 0;
    while let Ok(event) = event_rx.try_recv() {
        match event {
            QuizEvent::Tick { .. } => ticks += 1,
            QuizEvent::Answered(outcome) => {
                assert_eq!(outcome.answer, AnswerKind::TimedOut);
                assert!(!outcome.is_correct);
                timeouts += 1;
            }
            _ => {}
        }
    }

    assert_eq!(timeouts, 2);
    assert_eq!(ticks, 2 * 29);
    let DriverOutcome::Completed { completion, .. } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(completion.score, 0);
    assert!(started.elapsed() >= std::time::Duration::from_secs(2 * 30 + 2));
    assert_eq!(repo.list_scores(ScoreFilter::all()).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn driver_abandons_without_saving() {
    let repo = InMemoryRepository::new();
    let category = seed_category(&repo, "Science", 4).await;
    let storage = Storage::from_repository(repo.clone());
    let driver = driver_fixture(&storage);
    let mut rng = StdRng::seed_from_u64(4);
    let quiz = quiz_service(&storage)
        .start(&viewer(), category, &mut rng)
        .await
        .unwrap();

    let (answer_tx, answer_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { driver.run(quiz, answer_rx, event_tx).await });

    let mut answer_tx = Some(answer_tx);
    let mut saw_abandon = false;
    while let Some(event) = event_rx.recv().await {
        match event {
            QuizEvent::QuestionShown { question, .. } => {
                if let Some(tx) = answer_tx.as_ref() {
                    tx.send(question.correct_option()).await.unwrap();
                }
            }
            QuizEvent::Answered(_) => answer_tx = None,
            QuizEvent::Abandoned => saw_abandon = true,
            _ => {}
        }
    }

    assert!(saw_abandon);
    assert_eq!(handle.await.unwrap().unwrap(), DriverOutcome::Abandoned);
    assert!(repo.list_scores(ScoreFilter::all()).await.unwrap().is_empty());
}
