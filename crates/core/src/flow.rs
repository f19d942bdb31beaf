//! Assessment-taking state machine.
//!
//! `AssessmentFlow` only exists once the user, dataset and question set are
//! known, so every phase below can rely on a non-empty question list. The
//! surrounding "not loaded yet" state belongs to whoever performs the fetch.

use std::collections::HashMap;

use thiserror::Error;

use crate::guard::{LeaveDecision, LeaveSignal, leave_decision};
use crate::model::{
    AnswerStore, AnswerValue, AssessmentId, CourseId, DataSetId, ExistingAssessment,
    NewAssessment, PreSurvey, Progress, Question, QuestionId, QuestionSet, UserId,
};
use crate::pagination::{PageNumber, PaginationError, Paginator};
use crate::validation::{ValidationFlag, first_unanswered};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlowError {
    #[error("question set has no questions")]
    NoQuestions,
    #[error("pre-survey is not active")]
    NotInPreSurvey,
    #[error("pre-survey is incomplete")]
    PreSurveyIncomplete,
    #[error("answers can only be recorded while the assessment is in progress")]
    NotAnswering,
    #[error("question {0} is not part of this assessment")]
    UnknownQuestion(QuestionId),
    #[error("submit is only available on the last page")]
    NotOnLastPage,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("assessment is not completed")]
    NotCompleted,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

/// Coarse state reported to views and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Uninitialized,
    PreSurvey,
    InProgress,
    Submitting,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PreSurvey {
        known_assessment: Option<AssessmentId>,
    },
    InProgress {
        assessment_id: AssessmentId,
        page: PageNumber,
    },
    Submitting {
        assessment_id: AssessmentId,
        page: PageNumber,
    },
    Completed {
        assessment_id: AssessmentId,
    },
}

/// Everything fetched before the flow can exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    pub user_id: UserId,
    pub data_set_id: DataSetId,
    pub questions: QuestionSet,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPlan {
    Reuse(AssessmentId),
    Create(NewAssessment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAdvance {
    Advanced(PageNumber),
    /// Stayed on the page; the question is now flagged.
    Blocked(QuestionId),
    /// Already on the final page; submit instead.
    LastPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitGate {
    Ready(AssessmentId),
    Blocked(QuestionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    DashboardHome,
    Login,
}

/// Receipt for one local answer, used to match the backend acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTicket {
    pub assessment_id: AssessmentId,
    pub question: QuestionId,
    pub value: AnswerValue,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentFlow {
    user_id: UserId,
    data_set_id: DataSetId,
    questions: QuestionSet,
    pages: Paginator,
    phase: Phase,
    answers: AnswerStore,
    pre_survey: PreSurvey,
    progress: Progress,
    flag: ValidationFlag,
    latest_write: HashMap<QuestionId, u64>,
    next_seq: u64,
}

impl AssessmentFlow {
    fn from_context(context: FlowContext, phase: Phase) -> Result<Self, FlowError> {
        if context.questions.is_empty() {
            return Err(FlowError::NoQuestions);
        }
        let pages = Paginator::new(context.questions.len(), context.page_size)?;
        Ok(Self {
            user_id: context.user_id,
            data_set_id: context.data_set_id,
            questions: context.questions,
            pages,
            phase,
            answers: AnswerStore::new(),
            pre_survey: PreSurvey::new(),
            progress: Progress::NONE,
            flag: ValidationFlag::default(),
            latest_write: HashMap::new(),
            next_seq: 0,
        })
    }

    /// No attempt exists yet: start at the pre-survey.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NoQuestions` for an empty question set and
    /// `FlowError::Pagination` for a zero page size.
    pub fn fresh(context: FlowContext) -> Result<Self, FlowError> {
        Self::from_context(
            context,
            Phase::PreSurvey {
                known_assessment: None,
            },
        )
    }

    /// Continue an attempt the backend already holds.
    ///
    /// Saved answers replace the local store verbatim. Incomplete attempts
    /// resume on page 1; completed ones land in `Completed`; an attempt whose
    /// pre-survey was never recorded goes back to the pre-survey and reuses its id.
    ///
    /// # Errors
    ///
    /// Same as [`AssessmentFlow::fresh`].
    pub fn resume(
        context: FlowContext,
        existing: &ExistingAssessment,
        saved_answers: impl IntoIterator<Item = (QuestionId, AnswerValue)>,
    ) -> Result<Self, FlowError> {
        let assessment_id = existing.assessment_id;
        let phase = if existing.completed {
            Phase::Completed { assessment_id }
        } else if existing.is_first_year.is_none() {
            Phase::PreSurvey {
                known_assessment: Some(assessment_id),
            }
        } else {
            Phase::InProgress {
                assessment_id,
                page: PageNumber::FIRST,
            }
        };

        let mut flow = Self::from_context(context, phase)?;
        flow.answers.hydrate(saved_answers);
        flow.pre_survey = PreSurvey::from_existing(existing.is_first_year, existing.course_id);
        flow.progress = if existing.completed {
            Progress::COMPLETE
        } else {
            existing.progress
        };
        Ok(flow)
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        match self.phase {
            Phase::PreSurvey { .. } => FlowState::PreSurvey,
            Phase::InProgress { .. } => FlowState::InProgress,
            Phase::Submitting { .. } => FlowState::Submitting,
            Phase::Completed { .. } => FlowState::Completed,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn data_set_id(&self) -> DataSetId {
        self.data_set_id
    }

    #[must_use]
    pub fn assessment_id(&self) -> Option<AssessmentId> {
        match self.phase {
            Phase::PreSurvey { known_assessment } => known_assessment,
            Phase::InProgress { assessment_id, .. }
            | Phase::Submitting { assessment_id, .. }
            | Phase::Completed { assessment_id } => Some(assessment_id),
        }
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn pre_survey(&self) -> &PreSurvey {
        &self.pre_survey
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    #[must_use]
    pub fn flagged(&self) -> Option<QuestionId> {
        self.flag.flagged()
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pages.total_pages()
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.pages.page_size()
    }

    /// Current page while answering or submitting.
    #[must_use]
    pub fn current_page(&self) -> Option<PageNumber> {
        match self.phase {
            Phase::InProgress { page, .. } | Phase::Submitting { page, .. } => Some(page),
            Phase::PreSurvey { .. } | Phase::Completed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.current_page().is_some_and(|page| self.pages.is_last(page))
    }

    /// Questions on the current page, in display order. Empty outside paging.
    #[must_use]
    pub fn page_questions(&self) -> &[Question] {
        match self.current_page() {
            Some(page) => self.pages.slice(self.questions.questions(), page),
            None => &[],
        }
    }

    /// 0-based position of the first question of the current page.
    #[must_use]
    pub fn page_offset(&self) -> usize {
        self.current_page()
            .map_or(0, |page| self.pages.range(page).start)
    }

    // ─── Pre-survey ──────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `FlowError::NotInPreSurvey` outside the pre-survey.
    pub fn answer_first_year(&mut self, is_first_year: bool) -> Result<(), FlowError> {
        self.ensure_pre_survey()?;
        self.pre_survey.answer_first_year(is_first_year);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError::NotInPreSurvey` outside the pre-survey.
    pub fn select_course(&mut self, course: Option<CourseId>) -> Result<(), FlowError> {
        self.ensure_pre_survey()?;
        self.pre_survey.select_course(course);
        Ok(())
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self.phase, Phase::PreSurvey { .. }) && self.pre_survey.is_complete()
    }

    /// Decide whether starting needs a create call.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotInPreSurvey` or `FlowError::PreSurveyIncomplete`.
    pub fn start_plan(&self) -> Result<StartPlan, FlowError> {
        let Phase::PreSurvey { known_assessment } = self.phase else {
            return Err(FlowError::NotInPreSurvey);
        };
        if !self.pre_survey.is_complete() {
            return Err(FlowError::PreSurveyIncomplete);
        }
        if let Some(id) = known_assessment {
            return Ok(StartPlan::Reuse(id));
        }
        let is_first_year = self.pre_survey.is_first_year().unwrap_or(false);
        Ok(StartPlan::Create(NewAssessment {
            user_id: self.user_id,
            data_set_id: self.data_set_id,
            is_first_year,
            course_id: self.pre_survey.course(),
        }))
    }

    /// Enter the paged questions at page 1 under `assessment_id`.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotInPreSurvey` or `FlowError::PreSurveyIncomplete`.
    pub fn begin(&mut self, assessment_id: AssessmentId) -> Result<(), FlowError> {
        self.ensure_pre_survey()?;
        if !self.pre_survey.is_complete() {
            return Err(FlowError::PreSurveyIncomplete);
        }
        self.flag.clear();
        self.phase = Phase::InProgress {
            assessment_id,
            page: PageNumber::FIRST,
        };
        Ok(())
    }

    fn ensure_pre_survey(&self) -> Result<(), FlowError> {
        match self.phase {
            Phase::PreSurvey { .. } => Ok(()),
            _ => Err(FlowError::NotInPreSurvey),
        }
    }

    // ─── Answers ─────────────────────────────────────────────────────────────

    /// Update the local selection immediately and hand back a ticket for the
    /// background write. Answering the flagged question clears the flag.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotAnswering` outside `InProgress` and
    /// `FlowError::UnknownQuestion` for ids outside the question set.
    pub fn record_answer(
        &mut self,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<AnswerTicket, FlowError> {
        let Phase::InProgress { assessment_id, .. } = self.phase else {
            return Err(FlowError::NotAnswering);
        };
        if !self.questions.contains(question) {
            return Err(FlowError::UnknownQuestion(question));
        }

        self.answers.record(question, value);
        self.flag.clear_if_answered(question);

        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest_write.insert(question, seq);

        Ok(AnswerTicket {
            assessment_id,
            question,
            value,
            seq,
        })
    }

    /// Apply the backend's progress for a persisted answer.
    ///
    /// Ignored when a newer write for the same question was issued, when the
    /// ticket belongs to a discarded attempt, or once the flow is completed.
    /// Progress never moves backwards before completion.
    pub fn acknowledge(&mut self, ticket: &AnswerTicket, progress: Progress) -> bool {
        if matches!(self.phase, Phase::Completed { .. }) {
            return false;
        }
        if self.assessment_id() != Some(ticket.assessment_id) {
            return false;
        }
        if self.latest_write.get(&ticket.question) != Some(&ticket.seq) {
            return false;
        }
        if progress > self.progress {
            self.progress = progress;
        }
        true
    }

    // ─── Paging ──────────────────────────────────────────────────────────────

    /// Move forward if every question on the current page is answered.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotAnswering` outside `InProgress`.
    pub fn next_page(&mut self) -> Result<PageAdvance, FlowError> {
        let Phase::InProgress {
            assessment_id,
            page,
        } = self.phase
        else {
            return Err(FlowError::NotAnswering);
        };
        let Some(next) = self.pages.next(page) else {
            return Ok(PageAdvance::LastPage);
        };
        if let Some(missing) = first_unanswered(self.page_questions(), &self.answers) {
            self.flag.flag(missing);
            return Ok(PageAdvance::Blocked(missing));
        }

        self.flag.clear();
        self.phase = Phase::InProgress {
            assessment_id,
            page: next,
        };
        Ok(PageAdvance::Advanced(next))
    }

    /// Step back one page without validating the page being left.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotAnswering` outside `InProgress`.
    pub fn previous_page(&mut self) -> Result<Option<PageNumber>, FlowError> {
        let Phase::InProgress {
            assessment_id,
            page,
        } = self.phase
        else {
            return Err(FlowError::NotAnswering);
        };
        let Some(previous) = self.pages.previous(page) else {
            return Ok(None);
        };
        self.flag.clear();
        self.phase = Phase::InProgress {
            assessment_id,
            page: previous,
        };
        Ok(Some(previous))
    }

    // ─── Submission ──────────────────────────────────────────────────────────

    /// Validate the last page and enter `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotAnswering` outside `InProgress` and
    /// `FlowError::NotOnLastPage` before the final page.
    pub fn begin_submit(&mut self) -> Result<SubmitGate, FlowError> {
        let Phase::InProgress {
            assessment_id,
            page,
        } = self.phase
        else {
            return Err(FlowError::NotAnswering);
        };
        if !self.pages.is_last(page) {
            return Err(FlowError::NotOnLastPage);
        }
        if let Some(missing) = first_unanswered(self.page_questions(), &self.answers) {
            self.flag.flag(missing);
            return Ok(SubmitGate::Blocked(missing));
        }

        self.flag.clear();
        self.phase = Phase::Submitting {
            assessment_id,
            page,
        };
        Ok(SubmitGate::Ready(assessment_id))
    }

    /// # Errors
    ///
    /// Returns `FlowError::NotSubmitting` if no submission is in flight.
    pub fn submit_succeeded(&mut self) -> Result<(), FlowError> {
        let Phase::Submitting { assessment_id, .. } = self.phase else {
            return Err(FlowError::NotSubmitting);
        };
        self.phase = Phase::Completed { assessment_id };
        // Grading accepted the attempt; the backend marks it complete.
        self.progress = Progress::COMPLETE;
        Ok(())
    }

    /// Return to the page the submission was made from.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::NotSubmitting` if no submission is in flight.
    pub fn submit_failed(&mut self) -> Result<(), FlowError> {
        let Phase::Submitting {
            assessment_id,
            page,
        } = self.phase
        else {
            return Err(FlowError::NotSubmitting);
        };
        self.phase = Phase::InProgress {
            assessment_id,
            page,
        };
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError::NotCompleted` before completion.
    pub fn confirm_completion(&self) -> Result<NavTarget, FlowError> {
        match self.phase {
            Phase::Completed { .. } => Ok(NavTarget::DashboardHome),
            _ => Err(FlowError::NotCompleted),
        }
    }

    // ─── Retake / leaving ────────────────────────────────────────────────────

    /// Forget the current attempt entirely and go back to the pre-survey.
    /// Returns the id that was dropped.
    pub fn reset_for_retake(&mut self) -> Option<AssessmentId> {
        let previous = self.assessment_id();
        self.phase = Phase::PreSurvey {
            known_assessment: None,
        };
        self.answers.clear();
        self.pre_survey = PreSurvey::new();
        self.progress = Progress::NONE;
        self.flag.clear();
        self.latest_write.clear();
        previous
    }

    #[must_use]
    pub fn leave_decision(&self, signal: LeaveSignal) -> LeaveDecision {
        if matches!(self.phase, Phase::Completed { .. }) {
            return LeaveDecision::Allow;
        }
        leave_decision(self.progress, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionSetId;
    use crate::pagination::DEFAULT_PAGE_SIZE;

    fn context(count: u64) -> FlowContext {
        let questions = (1..=count)
            .map(|id| Question::new(QuestionId::new(id), format!("Statement {id}")))
            .collect();
        FlowContext {
            user_id: UserId::new(1),
            data_set_id: DataSetId::new(2),
            questions: QuestionSet::new(QuestionSetId::new(3), questions),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    fn value(v: i64) -> AnswerValue {
        AnswerValue::new(v).unwrap()
    }

    fn started(count: u64) -> AssessmentFlow {
        let mut flow = AssessmentFlow::fresh(context(count)).unwrap();
        flow.answer_first_year(false).unwrap();
        flow.begin(AssessmentId::new(50)).unwrap();
        flow
    }

    fn answer_range(flow: &mut AssessmentFlow, ids: impl IntoIterator<Item = u64>) {
        for id in ids {
            flow.record_answer(QuestionId::new(id), value(4)).unwrap();
        }
    }

    #[test]
    fn empty_question_set_cannot_build_a_flow() {
        assert_eq!(
            AssessmentFlow::fresh(context(0)).unwrap_err(),
            FlowError::NoQuestions
        );
    }

    #[test]
    fn fresh_flow_starts_in_pre_survey() {
        let flow = AssessmentFlow::fresh(context(45)).unwrap();
        assert_eq!(flow.state(), FlowState::PreSurvey);
        assert!(!flow.can_start());
        assert!(flow.page_questions().is_empty());
        assert_eq!(flow.assessment_id(), None);
    }

    #[test]
    fn start_requires_course_for_first_years() {
        let mut flow = AssessmentFlow::fresh(context(5)).unwrap();
        flow.answer_first_year(true).unwrap();
        assert!(!flow.can_start());
        assert_eq!(flow.start_plan(), Err(FlowError::PreSurveyIncomplete));

        flow.select_course(Some(CourseId::new(8))).unwrap();
        assert!(flow.can_start());
        assert_eq!(
            flow.start_plan().unwrap(),
            StartPlan::Create(NewAssessment {
                user_id: UserId::new(1),
                data_set_id: DataSetId::new(2),
                is_first_year: true,
                course_id: Some(CourseId::new(8)),
            })
        );
    }

    #[test]
    fn answers_are_rejected_before_start() {
        let mut flow = AssessmentFlow::fresh(context(5)).unwrap();
        assert_eq!(
            flow.record_answer(QuestionId::new(1), value(3)),
            Err(FlowError::NotAnswering)
        );
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut flow = started(5);
        assert_eq!(
            flow.record_answer(QuestionId::new(99), value(3)),
            Err(FlowError::UnknownQuestion(QuestionId::new(99)))
        );
    }

    #[test]
    fn walkthrough_of_three_pages() {
        let mut flow = started(45);
        assert_eq!(flow.total_pages(), 3);
        assert_eq!(flow.current_page(), Some(PageNumber::FIRST));

        answer_range(&mut flow, 1..=15);
        let page_two = flow.next_page().unwrap();
        assert_eq!(page_two, PageAdvance::Advanced(PageNumber::new(2).unwrap()));
        assert_eq!(flow.page_offset(), 15);

        answer_range(&mut flow, (16..=30).filter(|id| *id != 23));
        assert_eq!(
            flow.next_page().unwrap(),
            PageAdvance::Blocked(QuestionId::new(23))
        );
        assert_eq!(flow.flagged(), Some(QuestionId::new(23)));
        assert_eq!(flow.current_page(), PageNumber::new(2));

        flow.record_answer(QuestionId::new(23), value(1)).unwrap();
        assert_eq!(flow.flagged(), None);
        assert_eq!(
            flow.next_page().unwrap(),
            PageAdvance::Advanced(PageNumber::new(3).unwrap())
        );
        assert!(flow.is_last_page());
        assert_eq!(flow.next_page().unwrap(), PageAdvance::LastPage);

        answer_range(&mut flow, 31..=45);
        assert_eq!(
            flow.begin_submit().unwrap(),
            SubmitGate::Ready(AssessmentId::new(50))
        );
        assert_eq!(flow.state(), FlowState::Submitting);
        flow.submit_succeeded().unwrap();
        assert_eq!(flow.state(), FlowState::Completed);
        assert_eq!(flow.confirm_completion(), Ok(NavTarget::DashboardHome));
        assert_eq!(
            flow.record_answer(QuestionId::new(1), value(2)),
            Err(FlowError::NotAnswering)
        );
    }

    #[test]
    fn flag_clears_even_with_other_gaps_on_the_page() {
        let mut flow = started(15);
        flow.record_answer(QuestionId::new(2), value(3)).unwrap();
        assert_eq!(
            flow.begin_submit().unwrap(),
            SubmitGate::Blocked(QuestionId::new(1))
        );

        flow.record_answer(QuestionId::new(5), value(3)).unwrap();
        assert_eq!(flow.flagged(), Some(QuestionId::new(1)));

        flow.record_answer(QuestionId::new(1), value(3)).unwrap();
        assert_eq!(flow.flagged(), None);
        assert_eq!(flow.state(), FlowState::InProgress);
    }

    #[test]
    fn later_pages_do_not_block_earlier_ones() {
        let mut flow = started(30);
        answer_range(&mut flow, 1..=15);
        assert!(matches!(flow.next_page().unwrap(), PageAdvance::Advanced(_)));
    }

    #[test]
    fn previous_page_skips_validation() {
        let mut flow = started(30);
        answer_range(&mut flow, 1..=15);
        flow.next_page().unwrap();
        assert_eq!(flow.previous_page().unwrap(), Some(PageNumber::FIRST));
        assert_eq!(flow.previous_page().unwrap(), None);
    }

    #[test]
    fn submit_only_from_last_page() {
        let mut flow = started(30);
        assert_eq!(flow.begin_submit(), Err(FlowError::NotOnLastPage));
    }

    #[test]
    fn failed_submission_returns_to_the_same_page() {
        let mut flow = started(3);
        answer_range(&mut flow, 1..=3);
        flow.begin_submit().unwrap();
        flow.submit_failed().unwrap();
        assert_eq!(flow.state(), FlowState::InProgress);
        assert_eq!(flow.current_page(), Some(PageNumber::FIRST));
        assert_eq!(flow.answers().len(), 3);
    }

    #[test]
    fn only_latest_write_per_question_moves_progress() {
        let mut flow = started(10);
        let first = flow.record_answer(QuestionId::new(1), value(2)).unwrap();
        let second = flow.record_answer(QuestionId::new(1), value(5)).unwrap();

        assert!(!flow.acknowledge(&first, Progress::new(10.0)));
        assert_eq!(flow.progress(), Progress::NONE);

        assert!(flow.acknowledge(&second, Progress::new(10.0)));
        assert_eq!(flow.progress(), Progress::new(10.0));
    }

    #[test]
    fn progress_never_decreases() {
        let mut flow = started(10);
        let a = flow.record_answer(QuestionId::new(1), value(2)).unwrap();
        let b = flow.record_answer(QuestionId::new(2), value(2)).unwrap();
        flow.acknowledge(&b, Progress::new(20.0));
        flow.acknowledge(&a, Progress::new(10.0));
        assert_eq!(flow.progress(), Progress::new(20.0));
    }

    #[test]
    fn resume_hydrates_exact_answers_and_skips_pre_survey() {
        let existing = ExistingAssessment {
            assessment_id: AssessmentId::new(77),
            progress: Progress::new(20.0),
            completed: false,
            is_first_year: Some(false),
            course_id: None,
        };
        let saved = (1..=9).map(|id| (QuestionId::new(id), value(3)));
        let flow = AssessmentFlow::resume(context(45), &existing, saved).unwrap();

        assert_eq!(flow.state(), FlowState::InProgress);
        assert_eq!(flow.answers().len(), 9);
        assert_eq!(flow.current_page(), Some(PageNumber::FIRST));
        assert_eq!(flow.assessment_id(), Some(AssessmentId::new(77)));
        assert_eq!(flow.progress(), Progress::new(20.0));
    }

    #[test]
    fn resume_without_recorded_pre_survey_reuses_the_attempt() {
        let existing = ExistingAssessment {
            assessment_id: AssessmentId::new(5),
            progress: Progress::NONE,
            completed: false,
            is_first_year: None,
            course_id: None,
        };
        let mut flow = AssessmentFlow::resume(context(3), &existing, []).unwrap();
        assert_eq!(flow.state(), FlowState::PreSurvey);
        flow.answer_first_year(false).unwrap();
        assert_eq!(flow.start_plan(), Ok(StartPlan::Reuse(AssessmentId::new(5))));
    }

    #[test]
    fn resume_of_completed_attempt_is_terminal() {
        let existing = ExistingAssessment {
            assessment_id: AssessmentId::new(5),
            progress: Progress::new(100.0),
            completed: true,
            is_first_year: Some(true),
            course_id: Some(CourseId::new(2)),
        };
        let flow = AssessmentFlow::resume(context(3), &existing, []).unwrap();
        assert_eq!(flow.state(), FlowState::Completed);
        assert_eq!(flow.leave_decision(LeaveSignal::RouteChange), LeaveDecision::Allow);
    }

    #[test]
    fn retake_drops_attempt_and_ignores_stale_acks() {
        let mut flow = started(10);
        let ticket = flow.record_answer(QuestionId::new(1), value(3)).unwrap();

        assert_eq!(flow.reset_for_retake(), Some(AssessmentId::new(50)));
        assert_eq!(flow.state(), FlowState::PreSurvey);
        assert_eq!(flow.assessment_id(), None);
        assert!(flow.answers().is_empty());
        assert_eq!(flow.pre_survey().is_first_year(), None);

        flow.answer_first_year(false).unwrap();
        assert!(matches!(flow.start_plan(), Ok(StartPlan::Create(_))));
        flow.begin(AssessmentId::new(51)).unwrap();
        assert!(!flow.acknowledge(&ticket, Progress::new(10.0)));

        let fresh = flow.record_answer(QuestionId::new(1), value(3)).unwrap();
        assert_eq!(fresh.assessment_id, AssessmentId::new(51));
    }

    #[test]
    fn leave_warning_tracks_partial_progress() {
        let mut flow = started(10);
        assert_eq!(flow.leave_decision(LeaveSignal::WindowClose), LeaveDecision::Allow);
        let ticket = flow.record_answer(QuestionId::new(1), value(3)).unwrap();
        flow.acknowledge(&ticket, Progress::new(10.0));
        assert!(flow.leave_decision(LeaveSignal::WindowClose).needs_confirmation());
    }
}
