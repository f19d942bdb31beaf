//! Typed view of the assessment backend's REST surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use strand_core::model::{
    AnswerValue, AssessmentId, AuthToken, Course, DataSetId, ExistingAssessment, NewAssessment,
    OtpCode, Progress, QuestionId, QuestionSet, QuestionSetId, SignupForm, StrandResults, UserId,
    VerificationToken,
};

use crate::error::ApiError;

mod http;
mod memory;

pub use http::HttpAssessmentApi;
pub use memory::{ApiCall, InMemoryAssessmentApi};

/// `POST /login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

/// `POST /login` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply shape shared by the signup, OTP and password-reset endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct VerificationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "signup_token", alias = "reset_token")]
    pub token: Option<String>,
}

/// `GET /active-dataset` with either id possibly missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveDataset {
    #[serde(default)]
    pub data_set_id: Option<DataSetId>,
    #[serde(default)]
    pub question_set_id: Option<QuestionSetId>,
}

/// One row of `GET /assessment/{id}/answers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAnswer {
    pub question_id: QuestionId,
    pub answer_value: i64,
}

impl SavedAnswer {
    /// # Errors
    ///
    /// Returns `ApiError::Answer` when the backend stored a value outside 1..=5.
    pub fn into_pair(self) -> Result<(QuestionId, AnswerValue), ApiError> {
        Ok((self.question_id, AnswerValue::new(self.answer_value)?))
    }
}

/// Every call the assessment flow, dashboard and login screens make.
///
/// Authenticated calls take the token read from storage; how it travels is
/// up to the implementation's auth policy.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// `POST /login`. Returns the issued token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::LoginRejected` when the backend refuses the
    /// credentials, or a transport/status error.
    async fn login(&self, request: &LoginRequest) -> Result<AuthToken, ApiError>;

    /// `GET /check-session`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn check_session(&self, token: &AuthToken) -> Result<bool, ApiError>;

    /// `GET /me`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for a rejected token.
    async fn current_user(&self, token: &AuthToken) -> Result<UserId, ApiError>;

    /// `GET /active-dataset`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn active_dataset(&self, token: &AuthToken) -> Result<ActiveDataset, ApiError>;

    /// `GET /courses`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn courses(&self, token: &AuthToken) -> Result<Vec<Course>, ApiError>;

    /// `GET /question-sets/{id}`; `None` when the set does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn question_set(
        &self,
        token: &AuthToken,
        id: QuestionSetId,
    ) -> Result<Option<QuestionSet>, ApiError>;

    /// `GET /progress/{user_id}/{data_set_id}`; `None` when no attempt exists.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn existing_assessment(
        &self,
        token: &AuthToken,
        user: UserId,
        data_set: DataSetId,
    ) -> Result<Option<ExistingAssessment>, ApiError>;

    /// `GET /assessment/{id}/answers`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn saved_answers(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<Vec<SavedAnswer>, ApiError>;

    /// `POST /assessments`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn create_assessment(
        &self,
        token: &AuthToken,
        request: &NewAssessment,
    ) -> Result<AssessmentId, ApiError>;

    /// `PUT /assessment/{id}/answers`. The backend may omit progress.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn save_answer(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<Option<Progress>, ApiError>;

    /// `POST /submit_assessment/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn submit(&self, token: &AuthToken, assessment: AssessmentId) -> Result<(), ApiError>;

    /// `DELETE /assessment/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or status failures.
    async fn delete_assessment(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<(), ApiError>;

    /// `GET /results/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Locked` while the attempt is not completed.
    async fn results(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<StrandResults, ApiError>;

    /// `POST /signup`. The backend mails a code and returns the token that
    /// authorizes verifying it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the backend's message for a refused
    /// form (e.g. the email is already registered).
    async fn signup(&self, form: &SignupForm) -> Result<VerificationToken, ApiError>;

    /// `POST /verify-email`. Creates the account on success.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for a wrong code and
    /// `ApiError::Unauthorized` once the pending token has expired.
    async fn verify_email(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
    ) -> Result<(), ApiError>;

    /// `POST /signup/resend-otp`. The previous code and token stop working.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` once the pending token has expired.
    async fn resend_signup_otp(
        &self,
        pending: &VerificationToken,
    ) -> Result<VerificationToken, ApiError>;

    /// `POST /request-otp`. Mails a password-reset code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when no account uses `email`.
    async fn request_password_reset(&self, email: &str) -> Result<VerificationToken, ApiError>;

    /// `POST /forgot-password`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for a wrong code and
    /// `ApiError::Unauthorized` once the reset token has expired.
    async fn reset_password(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
        new_password: &str,
    ) -> Result<(), ApiError>;
}
