mod assessment_vm;
mod dashboard_vm;

pub use assessment_vm::{
    AssessmentScreen, COMPLETED_TITLE, CourseOptionVm, PreSurveyVm, QuestionPageVm, QuestionVm,
    SESSION_EXPIRED_MESSAGE, SUBMITTING_MESSAGE, ScaleOptionVm, VALIDATION_MESSAGE,
    parse_course_choice, question_dom_id, scale_options,
};
pub use dashboard_vm::{DashboardVm, NeighborRowVm, ResultsVm, ScoreRowVm};
