use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer value {0} is outside the 1-5 scale")]
    OutOfRange(i64),
}

/// A selection on the five-point agreement scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AnswerValue(u8);

impl AnswerValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a validated scale value.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, AnswerError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(AnswerError::OutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Strongly Disagree",
            2 => "Disagree",
            3 => "Neutral",
            4 => "Agree",
            _ => "Strongly Agree",
        }
    }

    /// All scale values in display order.
    pub fn scale() -> impl Iterator<Item = AnswerValue> {
        (Self::MIN..=Self::MAX).map(AnswerValue)
    }
}

impl TryFrom<i64> for AnswerValue {
    type Error = AnswerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AnswerValue> for i64 {
    fn from(value: AnswerValue) -> Self {
        i64::from(value.0)
    }
}

/// In-memory mapping from question to selected scale value.
///
/// Grows as the user answers; only `clear` (retake) shrinks it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with previously saved answers.
    pub fn hydrate(&mut self, saved: impl IntoIterator<Item = (QuestionId, AnswerValue)>) {
        self.answers = saved.into_iter().collect();
    }

    /// Record (or overwrite) the answer for a question. Returns the previous value.
    pub fn record(&mut self, question: QuestionId, value: AnswerValue) -> Option<AnswerValue> {
        self.answers.insert(question, value)
    }

    #[must_use]
    pub fn get(&self, question: QuestionId) -> Option<AnswerValue> {
        self.answers.get(&question).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.answers.contains_key(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Entries in question-id order.
    pub fn entries(&self) -> impl Iterator<Item = (QuestionId, AnswerValue)> + '_ {
        self.answers.iter().map(|(id, value)| (*id, *value))
    }
}
