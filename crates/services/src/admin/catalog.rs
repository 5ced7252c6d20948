use trivia_core::model::{Category, CategoryId, Question, QuestionId};

/// Local mirror of the question store used by the admin surface.
///
/// The store stays authoritative; the catalog is only updated after a write
/// has succeeded there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminCatalog {
    categories: Vec<Category>,
    questions: Vec<Question>,
}

impl AdminCatalog {
    #[must_use]
    pub fn new(categories: Vec<Category>, questions: Vec<Question>) -> Self {
        Self {
            categories,
            questions,
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id() == id)
    }

    pub fn questions_in(&self, category_id: CategoryId) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.category_id() == category_id)
    }

    pub(crate) fn insert_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    pub(crate) fn replace_category(&mut self, category: Category) {
        if let Some(slot) = self.categories.iter_mut().find(|c| c.id() == category.id()) {
            *slot = category;
        }
    }

    pub(crate) fn remove_category(&mut self, id: CategoryId) {
        self.categories.retain(|c| c.id() != id);
        self.questions.retain(|q| q.category_id() != id);
    }

    pub(crate) fn insert_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub(crate) fn replace_question(&mut self, question: Question) {
        if let Some(slot) = self.questions.iter_mut().find(|q| q.id() == question.id()) {
            *slot = question;
        }
    }

    pub(crate) fn remove_question(&mut self, id: QuestionId) {
        self.questions.retain(|q| q.id() != id);
    }
}
