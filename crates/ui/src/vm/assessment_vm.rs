use services::{ControllerStatus, HaltReason};
use strand_core::flow::{AssessmentFlow, FlowState};
use strand_core::model::{AnswerValue, Course, CourseId, QuestionId};

pub const VALIDATION_MESSAGE: &str = "⚠ Please answer this question before continuing";
pub const SUBMITTING_MESSAGE: &str = "Assessing your answers...";
pub const COMPLETED_TITLE: &str = "Assessment Complete!";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// What the assessment view renders for the current controller status.
#[derive(Clone, Debug, PartialEq)]
pub enum AssessmentScreen {
    Loading,
    SignInRequired,
    Unavailable(&'static str),
    PreSurvey(PreSurveyVm),
    Questions(QuestionPageVm),
    Completed,
}

impl AssessmentScreen {
    #[must_use]
    pub fn from_status(status: &ControllerStatus, courses: &[Course]) -> Self {
        match status {
            ControllerStatus::Uninitialized => Self::Loading,
            ControllerStatus::MustReauthenticate => Self::SignInRequired,
            ControllerStatus::Halted(reason) => Self::Unavailable(halt_message(*reason)),
            ControllerStatus::Ready(flow) => match flow.state() {
                FlowState::Uninitialized => Self::Loading,
                FlowState::PreSurvey => Self::PreSurvey(PreSurveyVm::new(flow, courses)),
                FlowState::InProgress | FlowState::Submitting => {
                    Self::Questions(QuestionPageVm::new(flow))
                }
                FlowState::Completed => Self::Completed,
            },
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

fn halt_message(reason: HaltReason) -> &'static str {
    match reason {
        HaltReason::NoActiveDataset => "No assessment is open right now. Please check back later.",
        HaltReason::NoQuestionSet => "The assessment questions are not available yet.",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseOptionVm {
    pub id: u64,
    pub name: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreSurveyVm {
    pub is_first_year: Option<bool>,
    pub show_courses: bool,
    pub courses: Vec<CourseOptionVm>,
    pub can_start: bool,
    /// An attempt already exists and only its pre-survey is missing.
    pub resuming: bool,
}

impl PreSurveyVm {
    #[must_use]
    pub fn new(flow: &AssessmentFlow, courses: &[Course]) -> Self {
        let survey = flow.pre_survey();
        let selected = survey.course();
        Self {
            is_first_year: survey.is_first_year(),
            show_courses: survey.is_first_year() == Some(true),
            courses: courses
                .iter()
                .map(|course| CourseOptionVm {
                    id: course.id.value(),
                    name: course.name.clone(),
                    selected: selected == Some(course.id),
                })
                .collect(),
            can_start: flow.can_start(),
            resuming: flow.assessment_id().is_some(),
        }
    }
}

/// Parse the value of the course `<select>`; the placeholder is empty.
#[must_use]
pub fn parse_course_choice(raw: &str) -> Option<CourseId> {
    raw.parse::<CourseId>().ok()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub id: QuestionId,
    pub number: usize,
    pub text: String,
    pub selected: Option<u8>,
    pub flagged: bool,
}

impl QuestionVm {
    #[must_use]
    pub fn dom_id(&self) -> String {
        question_dom_id(self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionPageVm {
    pub page: usize,
    pub total_pages: usize,
    pub progress: u8,
    pub questions: Vec<QuestionVm>,
    pub show_previous: bool,
    pub show_submit: bool,
    pub flagged: Option<QuestionId>,
}

impl QuestionPageVm {
    #[must_use]
    pub fn new(flow: &AssessmentFlow) -> Self {
        let page = flow.current_page().map_or(1, |page| page.get());
        let offset = flow.page_offset();
        let flagged = flow.flagged();
        let questions = flow
            .page_questions()
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionVm {
                id: question.id,
                number: offset + index + 1,
                text: question.text.clone(),
                selected: flow.answers().get(question.id).map(AnswerValue::value),
                flagged: flagged == Some(question.id),
            })
            .collect();

        Self {
            page,
            total_pages: flow.total_pages(),
            progress: flow.progress().rounded(),
            questions,
            show_previous: page > 1,
            show_submit: flow.is_last_page(),
            flagged,
        }
    }

    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "Page {} of {} | Progress: {}%",
            self.page, self.total_pages, self.progress
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleOptionVm {
    pub value: u8,
    pub label: &'static str,
}

#[must_use]
pub fn scale_options() -> Vec<ScaleOptionVm> {
    AnswerValue::scale()
        .map(|value| ScaleOptionVm {
            value: value.value(),
            label: value.label(),
        })
        .collect()
}

#[must_use]
pub fn question_dom_id(id: QuestionId) -> String {
    format!("question-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::flow::FlowContext;
    use strand_core::model::{
        AssessmentId, DataSetId, ExistingAssessment, Progress, Question, QuestionSet,
        QuestionSetId, UserId,
    };

    fn context(count: u64) -> FlowContext {
        let questions = (1..=count)
            .map(|id| Question::new(QuestionId::new(id), format!("Statement {id}")))
            .collect();
        FlowContext {
            user_id: UserId::new(1),
            data_set_id: DataSetId::new(1),
            questions: QuestionSet::new(QuestionSetId::new(1), questions),
            page_size: 15,
        }
    }

    fn courses() -> Vec<Course> {
        vec![
            Course::new(CourseId::new(4), "BS Nursing"),
            Course::new(CourseId::new(7), "BS Accountancy"),
        ]
    }

    fn in_progress(answered: u64) -> AssessmentFlow {
        let existing = ExistingAssessment {
            assessment_id: AssessmentId::new(9),
            progress: Progress::new(40.0),
            completed: false,
            is_first_year: Some(false),
            course_id: None,
        };
        let saved = (1..=answered).map(|id| {
            (
                QuestionId::new(id),
                AnswerValue::new(3).unwrap(),
            )
        });
        AssessmentFlow::resume(context(45), &existing, saved).unwrap()
    }

    #[test]
    fn status_maps_to_screens() {
        assert_eq!(
            AssessmentScreen::from_status(&ControllerStatus::Uninitialized, &[]),
            AssessmentScreen::Loading
        );
        assert_eq!(
            AssessmentScreen::from_status(&ControllerStatus::MustReauthenticate, &[]),
            AssessmentScreen::SignInRequired
        );
        assert!(matches!(
            AssessmentScreen::from_status(
                &ControllerStatus::Halted(HaltReason::NoActiveDataset),
                &[]
            ),
            AssessmentScreen::Unavailable(_)
        ));
    }

    #[test]
    fn pre_survey_enables_start_once_complete() {
        let mut flow = AssessmentFlow::fresh(context(45)).unwrap();
        let vm = PreSurveyVm::new(&flow, &courses());
        assert_eq!(vm.is_first_year, None);
        assert!(!vm.show_courses);
        assert!(!vm.can_start);
        assert!(!vm.resuming);

        flow.answer_first_year(true).unwrap();
        let vm = PreSurveyVm::new(&flow, &courses());
        assert!(vm.show_courses);
        assert!(!vm.can_start, "first-years must pick a course");

        flow.select_course(Some(CourseId::new(7))).unwrap();
        let vm = PreSurveyVm::new(&flow, &courses());
        assert!(vm.can_start);
        assert_eq!(
            vm.courses.iter().filter(|c| c.selected).map(|c| c.id).collect::<Vec<_>>(),
            vec![7]
        );
    }

    #[test]
    fn question_page_numbers_continue_across_pages() {
        let mut flow = in_progress(15);
        let vm = QuestionPageVm::new(&flow);
        assert_eq!(vm.status_line(), "Page 1 of 3 | Progress: 40%");
        assert!(!vm.show_previous);
        assert!(!vm.show_submit);
        assert_eq!(vm.questions.first().map(|q| q.selected), Some(Some(3)));

        flow.next_page().unwrap();
        let vm = QuestionPageVm::new(&flow);
        assert_eq!(vm.page, 2);
        assert_eq!(vm.questions.first().map(|q| q.number), Some(16));
        assert!(vm.show_previous);
        assert!(vm.questions.iter().all(|q| q.selected.is_none()));
    }

    #[test]
    fn blocked_advance_flags_one_question() {
        let mut flow = in_progress(20);
        flow.next_page().unwrap();
        flow.next_page().unwrap();

        let vm = QuestionPageVm::new(&flow);
        let flagged: Vec<_> = vm.questions.iter().filter(|q| q.flagged).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, QuestionId::new(21));
        assert_eq!(flagged[0].dom_id(), "question-21");
        assert_eq!(vm.flagged, Some(QuestionId::new(21)));
    }

    #[test]
    fn last_page_offers_submit() {
        let mut flow = in_progress(30);
        flow.next_page().unwrap();
        flow.next_page().unwrap();
        let vm = QuestionPageVm::new(&flow);
        assert_eq!(vm.page, 3);
        assert!(vm.show_submit);
    }

    #[test]
    fn course_choice_ignores_placeholder() {
        assert_eq!(parse_course_choice(""), None);
        assert_eq!(parse_course_choice("7"), Some(CourseId::new(7)));
    }

    #[test]
    fn scale_runs_from_disagree_to_agree() {
        let options = scale_options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].label, "Strongly Disagree");
        assert_eq!(options[4].value, 5);
    }
}
