use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{CategoryId, QuestionId};

//
// ─── OPTION TAGS ───────────────────────────────────────────────────────────────
//

/// One of the four answer slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionTag {
    A,
    B,
    C,
    D,
}

impl OptionTag {
    pub const ALL: [OptionTag; 4] = [OptionTag::A, OptionTag::B, OptionTag::C, OptionTag::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionTag::A => "a",
            OptionTag::B => "b",
            OptionTag::C => "c",
            OptionTag::D => "d",
        }
    }

    fn index(self) -> usize {
        match self {
            OptionTag::A => 0,
            OptionTag::B => 1,
            OptionTag::C => 2,
            OptionTag::D => 3,
        }
    }
}

impl fmt::Display for OptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid option tag: {raw} (expected a, b, c or d)")]
pub struct ParseOptionTagError {
    raw: String,
}

impl FromStr for OptionTag {
    type Err = ParseOptionTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(OptionTag::A),
            "b" => Ok(OptionTag::B),
            "c" => Ok(OptionTag::C),
            "d" => Ok(OptionTag::D),
            _ => Err(ParseOptionTagError { raw: s.to_string() }),
        }
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question input, as typed into an admin form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub category_id: Option<CategoryId>,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: OptionTag,
}

impl QuestionDraft {
    /// Trim every field and check that nothing required is missing.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingCategory` when no category is chosen,
    /// `QuestionError::EmptyText` for a blank question and
    /// `QuestionError::EmptyOption` for the first blank option.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let category_id = self.category_id.ok_or(QuestionError::MissingCategory)?;

        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let raw = [self.option_a, self.option_b, self.option_c, self.option_d];
        let mut options: [String; 4] = Default::default();
        for (tag, value) in OptionTag::ALL.into_iter().zip(raw) {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(QuestionError::EmptyOption(tag));
            }
            options[tag.index()] = trimmed.to_string();
        }

        Ok(ValidatedQuestion {
            category_id,
            text: text.to_string(),
            options,
            correct_option: self.correct_option,
        })
    }
}

/// A question that passed validation but has no storage id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub category_id: CategoryId,
    pub text: String,
    pub options: [String; 4],
    pub correct_option: OptionTag,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn option(&self, tag: OptionTag) -> &str {
        &self.options[tag.index()]
    }

    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            category_id: self.category_id,
            text: self.text,
            options: self.options,
            correct_option: self.correct_option,
        }
    }
}

/// A multiple-choice question belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category_id: CategoryId,
    text: String,
    options: [String; 4],
    correct_option: OptionTag,
}

impl Question {
    /// Rehydrate a question from persisted storage, re-applying validation.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any stored field is blank.
    pub fn from_persisted(
        id: QuestionId,
        category_id: CategoryId,
        text: String,
        options: [String; 4],
        correct_option: OptionTag,
    ) -> Result<Self, QuestionError> {
        let [option_a, option_b, option_c, option_d] = options;
        QuestionDraft {
            category_id: Some(category_id),
            text,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_option,
        }
        .validate()
        .map(|validated| validated.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn option(&self, tag: OptionTag) -> &str {
        &self.options[tag.index()]
    }

    /// All four options in display order.
    pub fn options(&self) -> impl Iterator<Item = (OptionTag, &str)> {
        OptionTag::ALL
            .into_iter()
            .map(move |tag| (tag, self.option(tag)))
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionTag {
        self.correct_option
    }

    #[must_use]
    pub fn is_correct(&self, tag: OptionTag) -> bool {
        self.correct_option == tag
    }

    /// Turn the question back into an editable draft.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            category_id: Some(self.category_id),
            text: self.text.clone(),
            option_a: self.option(OptionTag::A).to_string(),
            option_b: self.option(OptionTag::B).to_string(),
            option_c: self.option(OptionTag::C).to_string(),
            option_d: self.option(OptionTag::D).to_string(),
            correct_option: self.correct_option,
        }
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("please select a category")]
    MissingCategory,

    #[error("question cannot be empty")]
    EmptyText,

    #[error("all options must be filled (option {0} is empty)")]
    EmptyOption(OptionTag),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
