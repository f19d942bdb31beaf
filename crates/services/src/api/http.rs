use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use strand_core::model::{
    AnswerValue, AssessmentId, AuthToken, Course, DataSetId, ExistingAssessment, NewAssessment,
    OtpCode, Progress, Question, QuestionId, QuestionSet, QuestionSetId, SignupForm,
    StrandResults, UserId, VerificationToken,
};

use super::{
    ActiveDataset, AssessmentApi, LoginRequest, LoginResponse, SavedAnswer, VerificationResponse,
};
use crate::config::{ApiConfig, AuthPolicy};
use crate::error::ApiError;

const DEFAULT_LOGIN_FAILURE: &str = "Invalid email or password";
const DEFAULT_ACCOUNT_FAILURE: &str = "Something went wrong. Please try again.";

/// `reqwest` client for the assessment backend.
#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    config: ApiConfig,
}

impl HttpAssessmentApi {
    /// Build a client for `config`. Cookie policy gets a cookie store.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .cookie_store(config.auth == AuthPolicy::Cookie)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        match self.config.auth {
            AuthPolicy::Bearer => builder.bearer_auth(token.expose()),
            AuthPolicy::Cookie => builder,
        }
    }

    fn get(&self, path: &str, token: &AuthToken) -> RequestBuilder {
        self.authorize(self.client.get(self.config.endpoint(path)), token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AuthToken,
    ) -> Result<T, ApiError> {
        let response = ensure_success(self.get(path, token).send().await?)?;
        Ok(response.json().await?)
    }

    /// POST to one of the signup/reset endpoints. Their tokens only ever
    /// travel in response bodies, so `pending` always goes as a bearer header.
    async fn post_account<B: Serialize + Sync>(
        &self,
        path: &str,
        pending: Option<&VerificationToken>,
        body: &B,
    ) -> Result<VerificationResponse, ApiError> {
        let mut builder = self.client.post(self.config.endpoint(path)).json(body);
        if let Some(pending) = pending {
            builder = builder.bearer_auth(pending.expose());
        }
        let response = builder.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() && !status.is_client_error() {
            return Err(ApiError::HttpStatus(status));
        }
        let body = response.json::<VerificationResponse>().await.unwrap_or_default();
        account_outcome(status, body)
    }
}

/// Refusals arrive as 4xx (or a 200 with `success: false`) carrying a message.
fn account_outcome(
    status: StatusCode,
    body: VerificationResponse,
) -> Result<VerificationResponse, ApiError> {
    if status.is_success() && body.success {
        return Ok(body);
    }
    let message = body
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ACCOUNT_FAILURE.to_string());
    Err(ApiError::Rejected(message))
}

fn pending_token(body: VerificationResponse) -> Result<VerificationToken, ApiError> {
    body.token
        .and_then(VerificationToken::new)
        .ok_or_else(|| ApiError::Payload("code sent without a verification token".into()))
}

fn status_error(status: StatusCode) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Locked,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        other => ApiError::HttpStatus(other),
    }
}

fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(status_error(status))
    }
}

/// "No attempt yet" can also arrive as a 200 with a null body or an `error` field.
fn existing_from_body(body: serde_json::Value) -> Result<Option<ExistingAssessment>, ApiError> {
    if body.is_null() || body.get("error").is_some() {
        return Ok(None);
    }
    serde_json::from_value(body)
        .map(Some)
        .map_err(|err| ApiError::Payload(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct CurrentUserBody {
    user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    #[serde(default)]
    logged_in: bool,
}

#[derive(Debug, Deserialize)]
struct QuestionSetBody {
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    assessment_id: AssessmentId,
}

#[derive(Debug, Serialize)]
struct SaveAnswerBody {
    question_id: QuestionId,
    answer: AnswerValue,
}

#[derive(Debug, Deserialize)]
struct SaveAnswerAckBody {
    #[serde(default)]
    progress: Option<Progress>,
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthToken, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint("/login"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let rejected = matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED);
        if !status.is_success() && !rejected {
            return Err(ApiError::HttpStatus(status));
        }

        let body: LoginResponse = response.json().await?;
        if rejected || !body.success {
            let message = body
                .message
                .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string());
            return Err(ApiError::LoginRejected(message));
        }

        body.token
            .and_then(AuthToken::new)
            .ok_or_else(|| ApiError::Payload("login succeeded without a token".into()))
    }

    async fn check_session(&self, token: &AuthToken) -> Result<bool, ApiError> {
        let response = self.get("/check-session", token).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        let body: SessionBody = ensure_success(response)?.json().await?;
        Ok(body.logged_in)
    }

    async fn current_user(&self, token: &AuthToken) -> Result<UserId, ApiError> {
        let body: CurrentUserBody = self.get_json("/me", token).await?;
        Ok(body.user_id)
    }

    async fn active_dataset(&self, token: &AuthToken) -> Result<ActiveDataset, ApiError> {
        let response = self.get("/active-dataset", token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ActiveDataset::default());
        }
        Ok(ensure_success(response)?.json().await?)
    }

    async fn courses(&self, token: &AuthToken) -> Result<Vec<Course>, ApiError> {
        self.get_json("/courses", token).await
    }

    async fn question_set(
        &self,
        token: &AuthToken,
        id: QuestionSetId,
    ) -> Result<Option<QuestionSet>, ApiError> {
        let response = self
            .get(&format!("/question-sets/{id}"), token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: QuestionSetBody = ensure_success(response)?.json().await?;
        Ok(Some(QuestionSet::new(id, body.questions)))
    }

    async fn existing_assessment(
        &self,
        token: &AuthToken,
        user: UserId,
        data_set: DataSetId,
    ) -> Result<Option<ExistingAssessment>, ApiError> {
        let response = self
            .get(&format!("/progress/{user}/{data_set}"), token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: serde_json::Value = ensure_success(response)?.json().await?;
        existing_from_body(body)
    }

    async fn saved_answers(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<Vec<SavedAnswer>, ApiError> {
        self.get_json(&format!("/assessment/{assessment}/answers"), token)
            .await
    }

    async fn create_assessment(
        &self,
        token: &AuthToken,
        request: &NewAssessment,
    ) -> Result<AssessmentId, ApiError> {
        let builder = self
            .client
            .post(self.config.endpoint("/assessments"))
            .json(request);
        let response = ensure_success(self.authorize(builder, token).send().await?)?;
        let body: CreatedBody = response.json().await?;
        Ok(body.assessment_id)
    }

    async fn save_answer(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<Option<Progress>, ApiError> {
        let builder = self
            .client
            .put(
                self.config
                    .endpoint(&format!("/assessment/{assessment}/answers")),
            )
            .json(&SaveAnswerBody {
                question_id: question,
                answer: value,
            });
        let response = ensure_success(self.authorize(builder, token).send().await?)?;
        let body: SaveAnswerAckBody = response.json().await?;
        Ok(body.progress)
    }

    async fn submit(&self, token: &AuthToken, assessment: AssessmentId) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(
                self.config
                    .endpoint(&format!("/submit_assessment/{assessment}")),
            )
            .json(&serde_json::json!({}));
        ensure_success(self.authorize(builder, token).send().await?)?;
        Ok(())
    }

    async fn delete_assessment(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<(), ApiError> {
        let builder = self
            .client
            .delete(self.config.endpoint(&format!("/assessment/{assessment}")));
        ensure_success(self.authorize(builder, token).send().await?)?;
        Ok(())
    }

    async fn results(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<StrandResults, ApiError> {
        self.get_json(&format!("/results/{assessment}"), token).await
    }

    async fn signup(&self, form: &SignupForm) -> Result<VerificationToken, ApiError> {
        pending_token(self.post_account("/signup", None, form).await?)
    }

    async fn verify_email(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "otp": otp });
        self.post_account("/verify-email", Some(pending), &body)
            .await
            .map(|_| ())
    }

    async fn resend_signup_otp(
        &self,
        pending: &VerificationToken,
    ) -> Result<VerificationToken, ApiError> {
        let body = serde_json::json!({});
        pending_token(
            self.post_account("/signup/resend-otp", Some(pending), &body)
                .await?,
        )
    }

    async fn request_password_reset(&self, email: &str) -> Result<VerificationToken, ApiError> {
        let body = serde_json::json!({ "email": email.trim() });
        pending_token(self.post_account("/request-otp", None, &body).await?)
    }

    async fn reset_password(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "otp": otp,
            "reset_token": pending.expose(),
            "newPassword": new_password,
        });
        self.post_account("/forgot-password", Some(pending), &body)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_api_errors() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED),
            ApiError::Unauthorized
        ));
        assert!(matches!(status_error(StatusCode::FORBIDDEN), ApiError::Locked));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR)
        ));
    }

    #[test]
    fn answer_body_uses_backend_field_names() {
        let body = SaveAnswerBody {
            question_id: QuestionId::new(7),
            answer: AnswerValue::new(5).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"question_id": 7, "answer": 5})
        );
    }

    #[test]
    fn progress_body_accepts_null_progress() {
        let existing = existing_from_body(serde_json::json!({
            "assessment_id": 12,
            "progress": null,
            "completed": false,
            "is_first_year": true,
            "course_id": 3
        }))
        .unwrap()
        .expect("attempt");
        assert_eq!(existing.assessment_id, AssessmentId::new(12));
        assert_eq!(existing.progress, Progress::NONE);

        assert!(existing_from_body(serde_json::Value::Null).unwrap().is_none());
        assert!(
            existing_from_body(serde_json::json!({"error": "No assessment found"}))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn account_refusals_carry_the_backend_message() {
        let refused = VerificationResponse {
            success: false,
            message: Some("Email already registered".into()),
            token: None,
        };
        assert!(matches!(
            account_outcome(StatusCode::BAD_REQUEST, refused),
            Err(ApiError::Rejected(message)) if message == "Email already registered"
        ));
        assert!(matches!(
            account_outcome(StatusCode::NOT_FOUND, VerificationResponse::default()),
            Err(ApiError::Rejected(message)) if message == DEFAULT_ACCOUNT_FAILURE
        ));

        let sent = VerificationResponse {
            success: true,
            message: None,
            token: Some("signup-jwt".into()),
        };
        let body = account_outcome(StatusCode::OK, sent).unwrap();
        assert_eq!(pending_token(body).unwrap().expose(), "signup-jwt");
        assert!(matches!(
            pending_token(VerificationResponse {
                success: true,
                ..VerificationResponse::default()
            }),
            Err(ApiError::Payload(_))
        ));
    }

    #[test]
    fn cookie_policy_builds_a_client() {
        let config = ApiConfig {
            auth: AuthPolicy::Cookie,
            ..ApiConfig::default()
        };
        let api = HttpAssessmentApi::new(config).unwrap();
        assert_eq!(api.config().auth, AuthPolicy::Cookie);
    }
}
