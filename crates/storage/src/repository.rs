use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use trivia_core::model::{
    Category, CategoryId, CategoryName, NewScore, Question, QuestionId, ScoreId, ScoreRecord,
    UserId, ValidatedQuestion,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Optional narrowing for score listings. The default matches every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreFilter {
    pub user_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
}

impl ScoreFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &ScoreRecord) -> bool {
        let user_ok = self.user_id.is_none_or(|u| record.user_id == Some(u));
        let category_ok = self
            .category_id
            .is_none_or(|c| record.category_id == Some(c));
        user_ok && category_ok
    }
}

/// Category half of the question store.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the category cannot be stored.
    async fn insert_category(&self, name: &CategoryName) -> Result<Category, StorageError>;

    /// Rename an existing category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist.
    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<Category, StorageError>;

    /// Delete a category together with its questions and score rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError>;

    /// Fetch a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing row is `Ok(None)`.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError>;

    /// List every category ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;
}

/// Question half of the question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a validated question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if its category does not exist.
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError>;

    /// Overwrite a stored question, including its category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question or its new category is missing.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Delete a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// Every question of one category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self, category_id: CategoryId)
    -> Result<Vec<Question>, StorageError>;

    /// Every question of every category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_all_questions(&self) -> Result<Vec<Question>, StorageError>;
}

/// Append-only score store.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Append one completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the referenced category is gone.
    async fn append_score(&self, score: &NewScore) -> Result<ScoreRecord, StorageError>;

    /// List score rows in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_scores(&self, filter: ScoreFilter) -> Result<Vec<ScoreRecord>, StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    categories: BTreeMap<CategoryId, Category>,
    questions: BTreeMap<QuestionId, Question>,
    scores: Vec<ScoreRecord>,
    next_category: u64,
    next_question: u64,
    next_score: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn insert_category(&self, name: &CategoryName) -> Result<Category, StorageError> {
        let mut guard = self.lock()?;
        guard.next_category += 1;
        let category = Category::new(CategoryId::new(guard.next_category), name.clone());
        guard.categories.insert(category.id(), category.clone());
        Ok(category)
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<Category, StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.categories.get_mut(&id).ok_or(StorageError::NotFound)?;
        *slot = slot.renamed(name.clone());
        Ok(slot.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.categories.remove(&id).ok_or(StorageError::NotFound)?;
        guard.questions.retain(|_, q| q.category_id() != id);
        guard.scores.retain(|s| s.category_id != Some(id));
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.categories.values().cloned().collect())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&question.category_id) {
            return Err(StorageError::NotFound);
        }
        guard.next_question += 1;
        let question = question.assign_id(QuestionId::new(guard.next_question));
        guard.questions.insert(question.id(), question.clone());
        Ok(question)
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&question.category_id()) {
            return Err(StorageError::NotFound);
        }
        let slot = guard
            .questions
            .get_mut(&question.id())
            .ok_or(StorageError::NotFound)?;
        *slot = question.clone();
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list_questions(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .filter(|q| q.category_id() == category_id)
            .cloned()
            .collect())
    }

    async fn list_all_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.questions.values().cloned().collect())
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn append_score(&self, score: &NewScore) -> Result<ScoreRecord, StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&score.category_id()) {
            return Err(StorageError::NotFound);
        }
        guard.next_score += 1;
        let record = score.clone().into_record(ScoreId::new(guard.next_score));
        guard.scores.push(record.clone());
        Ok(record)
    }

    async fn list_scores(&self, filter: ScoreFilter) -> Result<Vec<ScoreRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .scores
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }
}

/// Aggregates the question and score stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub categories: Arc<dyn CategoryRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub scores: Arc<dyn ScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one backend across all three stores.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CategoryRepository + QuestionRepository + ScoreRepository + Clone + 'static,
    {
        let categories: Arc<dyn CategoryRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn ScoreRepository> = Arc::new(repo);
        Self {
            categories,
            questions,
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivia_core::model::{OptionTag, QuestionDraft};
    use trivia_core::time::fixed_now;

    fn name(raw: &str) -> CategoryName {
        CategoryName::new(raw).unwrap()
    }

    fn validated(category_id: CategoryId, text: &str) -> ValidatedQuestion {
        QuestionDraft {
            category_id: Some(category_id),
            text: text.into(),
            option_a: "1".into(),
            option_b: "2".into(),
            option_c: "3".into(),
            option_d: "4".into(),
            correct_option: OptionTag::C,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn deleting_category_cascades() {
        let repo = InMemoryRepository::new();
        let keep = repo.insert_category(&name("Keep")).await.unwrap();
        let drop = repo.insert_category(&name("Drop")).await.unwrap();
        repo.insert_question(validated(keep.id(), "k")).await.unwrap();
        repo.insert_question(validated(drop.id(), "d")).await.unwrap();
        let user = UserId::random();
        for category in [keep.id(), drop.id()] {
            let score = NewScore::new(user, "p@example.com", category, 1, 1, fixed_now()).unwrap();
            repo.append_score(&score).await.unwrap();
        }

        repo.delete_category(drop.id()).await.unwrap();

        assert_eq!(repo.list_categories().await.unwrap(), vec![keep.clone()]);
        assert_eq!(repo.list_all_questions().await.unwrap().len(), 1);
        let scores = repo.list_scores(ScoreFilter::all()).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].category_id, Some(keep.id()));
    }

    #[tokio::test]
    async fn question_requires_existing_category() {
        let repo = InMemoryRepository::new();
        let err = repo
            .insert_question(validated(CategoryId::new(99), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn score_filter_narrows_by_user_and_category() {
        let repo = InMemoryRepository::new();
        let c1 = repo.insert_category(&name("One")).await.unwrap().id();
        let c2 = repo.insert_category(&name("Two")).await.unwrap().id();
        let alice = UserId::random();
        let bob = UserId::random();
        for (user, category) in [(alice, c1), (alice, c2), (bob, c1)] {
            let score = NewScore::new(user, "", category, 0, 5, fixed_now()).unwrap();
            repo.append_score(&score).await.unwrap();
        }

        let alice_rows = repo
            .list_scores(ScoreFilter::all().for_user(alice))
            .await
            .unwrap();
        assert_eq!(alice_rows.len(), 2);

        let c1_rows = repo
            .list_scores(ScoreFilter::all().in_category(c1))
            .await
            .unwrap();
        assert_eq!(c1_rows.len(), 2);

        let both = repo
            .list_scores(ScoreFilter::all().for_user(bob).in_category(c2))
            .await
            .unwrap();
        assert!(both.is_empty());
    }

    #[tokio::test]
    async fn rename_missing_category_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .rename_category(CategoryId::new(5), &name("Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
