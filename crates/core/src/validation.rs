use crate::model::{AnswerStore, Question, QuestionId};

/// First question on the page without an answer, in display order.
#[must_use]
pub fn first_unanswered(page: &[Question], answers: &AnswerStore) -> Option<QuestionId> {
    page.iter()
        .map(|question| question.id)
        .find(|id| !answers.is_answered(*id))
}

/// At most one question flagged as "please answer before continuing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationFlag(Option<QuestionId>);

impl ValidationFlag {
    #[must_use]
    pub fn flagged(&self) -> Option<QuestionId> {
        self.0
    }

    #[must_use]
    pub fn is_flagged(&self, question: QuestionId) -> bool {
        self.0 == Some(question)
    }

    pub fn flag(&mut self, question: QuestionId) {
        self.0 = Some(question);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Clear the flag only if it points at `question`.
    pub fn clear_if_answered(&mut self, question: QuestionId) -> bool {
        if self.is_flagged(question) {
            self.0 = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerValue;

    fn questions(ids: &[u64]) -> Vec<Question> {
        ids.iter()
            .map(|id| Question::new(QuestionId::new(*id), format!("Q{id}")))
            .collect()
    }

    #[test]
    fn finds_first_gap_in_display_order() {
        let page = questions(&[30, 10, 20]);
        let mut answers = AnswerStore::new();
        answers.record(QuestionId::new(30), AnswerValue::new(3).unwrap());

        assert_eq!(first_unanswered(&page, &answers), Some(QuestionId::new(10)));

        answers.record(QuestionId::new(10), AnswerValue::new(3).unwrap());
        answers.record(QuestionId::new(20), AnswerValue::new(3).unwrap());
        assert_eq!(first_unanswered(&page, &answers), None);
    }

    #[test]
    fn flag_only_clears_for_the_flagged_question() {
        let mut flag = ValidationFlag::default();
        flag.flag(QuestionId::new(23));

        assert!(!flag.clear_if_answered(QuestionId::new(24)));
        assert_eq!(flag.flagged(), Some(QuestionId::new(23)));

        assert!(flag.clear_if_answered(QuestionId::new(23)));
        assert_eq!(flag.flagged(), None);
    }
}
