use std::sync::Arc;

use storage::repository::{CategoryRepository, QuestionRepository};
use trivia_core::model::{Category, CategoryId, CategoryName, Question, QuestionDraft, QuestionId};

use super::catalog::AdminCatalog;
use crate::error::AdminError;
use crate::policy::CallPolicy;

/// Validated CRUD over categories and questions.
///
/// Input is validated before any store call. Each successful write is then
/// applied to the local [`AdminCatalog`].
pub struct AdminService {
    policy: CallPolicy,
    categories: Arc<dyn CategoryRepository>,
    questions: Arc<dyn QuestionRepository>,
    catalog: AdminCatalog,
}

impl AdminService {
    #[must_use]
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            policy: CallPolicy::default(),
            categories,
            questions,
            catalog: AdminCatalog::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &AdminCatalog {
        &self.catalog
    }

    /// Reload the catalog from the store.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if either listing fails; the previous
    /// catalog is kept in that case.
    pub async fn refresh(&mut self) -> Result<&AdminCatalog, AdminError> {
        let categories = self
            .policy
            .run("list_categories", self.categories.list_categories())
            .await?;
        let questions = self
            .policy
            .run("list_all_questions", self.questions.list_all_questions())
            .await?;
        self.catalog = AdminCatalog::new(categories, questions);
        Ok(&self.catalog)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Category` for a blank name, `AdminError::Storage`
    /// if the insert fails.
    pub async fn create_category(&mut self, name: &str) -> Result<Category, AdminError> {
        let name = CategoryName::new(name)?;
        let category = self
            .policy
            .run("insert_category", self.categories.insert_category(&name))
            .await?;
        tracing::info!(category_id = %category.id(), name = %category.name(), "category created");
        self.catalog.insert_category(category.clone());
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Category` for a blank name, `AdminError::Storage`
    /// if the category is missing or the update fails.
    pub async fn rename_category(
        &mut self,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, AdminError> {
        let name = CategoryName::new(name)?;
        let category = self
            .policy
            .run("rename_category", self.categories.rename_category(id, &name))
            .await?;
        self.catalog.replace_category(category.clone());
        Ok(category)
    }

    /// Delete a category; its questions and score rows go with it.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the category is missing or the delete fails.
    pub async fn delete_category(&mut self, id: CategoryId) -> Result<(), AdminError> {
        self.policy
            .run("delete_category", self.categories.delete_category(id))
            .await?;
        tracing::info!(category_id = %id, "category deleted");
        self.catalog.remove_category(id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AdminError::Question` for incomplete drafts, `AdminError::Storage`
    /// if the category is missing or the insert fails.
    pub async fn create_question(&mut self, draft: QuestionDraft) -> Result<Question, AdminError> {
        let validated = draft.validate()?;
        let question = self
            .policy
            .run("insert_question", self.questions.insert_question(validated))
            .await?;
        self.catalog.insert_question(question.clone());
        Ok(question)
    }

    /// Overwrite question `id` with `draft`, which may move it to another category.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Question` for incomplete drafts, `AdminError::Storage`
    /// if the question or category is missing or the update fails.
    pub async fn update_question(
        &mut self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, AdminError> {
        let question = draft.validate()?.assign_id(id);
        self.policy
            .run("update_question", self.questions.update_question(&question))
            .await?;
        self.catalog.replace_question(question.clone());
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the question is missing or the delete fails.
    pub async fn delete_question(&mut self, id: QuestionId) -> Result<(), AdminError> {
        self.policy
            .run("delete_question", self.questions.delete_question(id))
            .await?;
        self.catalog.remove_question(id);
        Ok(())
    }
}
