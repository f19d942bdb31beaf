use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, QuestionSetId};

/// A single Likert-scale statement presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question_id")]
    pub id: QuestionId,
    #[serde(rename = "question_text")]
    pub text: String,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Ordered questions of the active dataset. Order defines page membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    id: QuestionSetId,
    questions: Vec<Question>,
}

impl QuestionSet {
    #[must_use]
    pub fn new(id: QuestionSetId, questions: Vec<Question>) -> Self {
        Self { id, questions }
    }

    #[must_use]
    pub fn id(&self) -> QuestionSetId {
        self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.questions.iter().any(|q| q.id == id)
    }
}
