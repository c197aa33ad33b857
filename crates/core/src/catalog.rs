use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Category, Question, QuestionDraft, QuestionError, QuestionId};

const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog has no questions")]
    Empty,

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("malformed catalog data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Ordered, read-only question bank.
///
/// Catalog order is the order normal mode walks through; lookups by id serve
/// review mode, which only knows question ids.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Validate drafts into a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the list is empty, a question is invalid, or
    /// two questions share an id.
    pub fn new(drafts: Vec<QuestionDraft>) -> Result<Self, CatalogError> {
        if drafts.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(drafts.len());
        let mut questions = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let question = draft.validate()?;
            if !seen.insert(question.id()) {
                return Err(CatalogError::DuplicateId(question.id()));
            }
            questions.push(question);
        }

        Ok(Self { questions })
    }

    /// Parse and validate a JSON array of questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, otherwise the same
    /// errors as [`QuestionCatalog::new`].
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(raw)?;
        Self::new(drafts)
    }

    /// The question bank shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded data is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_QUESTIONS)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at a position in catalog order.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn count_in(&self, category: Category) -> usize {
        self.questions
            .iter()
            .filter(|q| q.category() == category)
            .count()
    }
}
