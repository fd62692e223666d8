use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question category cannot be empty")]
    EmptyCategory,

    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("option `{option}` appears more than once")]
    DuplicateOption { option: String },

    #[error("correct option `{correct}` is not one of the options")]
    CorrectOptionMissing { correct: String },

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuestionError::InvalidDifficulty(s.to_string())),
        }
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question input, e.g. from the admin tools or a remote row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: String,
    pub category: String,
    pub difficulty: Difficulty,
}

impl QuestionDraft {
    /// Trim and check the draft.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or category is blank, there are
    /// fewer than two options, an option is blank or repeated, or the correct
    /// option is not one of the options.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        let category = self.category.trim().to_ascii_lowercase();
        if category.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        let mut options = Vec::with_capacity(self.options.len());
        for (index, raw) in self.options.into_iter().enumerate() {
            let option = raw.trim().to_string();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            if !seen.insert(option.clone()) {
                return Err(QuestionError::DuplicateOption { option });
            }
            options.push(option);
        }

        let correct_option = self.correct_option.trim().to_string();
        if !seen.contains(&correct_option) {
            return Err(QuestionError::CorrectOptionMissing {
                correct: correct_option,
            });
        }

        Ok(ValidatedQuestion {
            prompt,
            options,
            correct_option,
            category,
            difficulty: self.difficulty,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    prompt: String,
    options: Vec<String>,
    correct_option: String,
    category: String,
    difficulty: Difficulty,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            prompt: self.prompt,
            options: self.options,
            correct_option: self.correct_option,
            category: self.category,
            difficulty: self.difficulty,
        }
    }
}

/// A multiple-choice aptitude question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: String,
    category: String,
    difficulty: Difficulty,
}

impl Question {
    /// Rehydrate a question from persisted fields.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stored fields violate question invariants.
    pub fn from_persisted(id: QuestionId, draft: QuestionDraft) -> Result<Self, QuestionError> {
        Ok(draft.validate()?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Exact string comparison against the correct option.
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_option == choice
    }

    /// Back to an editable draft, e.g. for the admin update flow.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            prompt: self.prompt.clone(),
            options: self.options.clone(),
            correct_option: self.correct_option.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
