mod account;
mod answer;
mod assessment;
mod auth;
mod course;
mod ids;
mod question;
mod results;

pub use ids::{AssessmentId, CourseId, DataSetId, ParseIdError, QuestionId, QuestionSetId, UserId};

pub use account::{
    AccountFormError, OTP_LENGTH, OtpCode, PasswordReset, SignupForm, VerificationToken,
};
pub use answer::{AnswerError, AnswerStore, AnswerValue};
pub use assessment::{ExistingAssessment, NewAssessment, PreSurvey, Progress};
pub use auth::{AuthToken, TokenScope};
pub use course::Course;
pub use question::{Question, QuestionSet};
pub use results::{Neighbor, Strand, StrandResults, TieInfo};
