//! Question content consumed from the question store
//!
//! Questions are owned by the external question store. The core only reads
//! them: it checks their shape, presents them in order and grades answers
//! against the recorded correct option.

use std::fmt::Display;

use enum_map::{Enum, EnumMap};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Identifier of a question in the question store
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a category in the question store
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Label of one of the four options of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum OptionLabel {
    /// First option
    A,
    /// Second option
    B,
    /// Third option
    C,
    /// Fourth option
    D,
}

type ValidationResult = garde::Result;

fn validate_options(options: &EnumMap<OptionLabel, String>, _ctx: &()) -> ValidationResult {
    for (label, text) in options {
        if text.trim().is_empty() {
            return Err(garde::Error::new(format!("option {label:?} is empty")));
        }
        if text.chars().count() > crate::constants::question::MAX_OPTION_LENGTH {
            return Err(garde::Error::new(format!("option {label:?} is too long")));
        }
    }
    Ok(())
}

/// A multiple choice question with four labelled options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier in the question store
    #[garde(skip)]
    pub id: QuestionId,
    /// The question text
    #[garde(length(min = 1, max = crate::constants::question::MAX_TEXT_LENGTH))]
    pub text: String,
    /// The four options, keyed by label
    #[garde(custom(validate_options))]
    pub options: EnumMap<OptionLabel, String>,
    /// Label of the correct option
    #[garde(skip)]
    pub correct_answer: OptionLabel,
    /// Difficulty from 1 (easy) to 3 (hard)
    #[garde(range(min = crate::constants::question::MIN_DIFFICULTY, max = crate::constants::question::MAX_DIFFICULTY))]
    pub difficulty_level: u8,
    /// Category the question belongs to
    #[garde(skip)]
    pub category_id: CategoryId,
}

impl Question {
    /// Grades a selection; a missing selection is never correct
    pub fn is_correct(&self, selected: Option<OptionLabel>) -> bool {
        selected == Some(self.correct_answer)
    }
}
