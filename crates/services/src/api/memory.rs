use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use strand_core::model::{
    AnswerValue, AssessmentId, AuthToken, Course, CourseId, DataSetId, ExistingAssessment,
    NewAssessment, OtpCode, Progress, Question, QuestionId, QuestionSet, QuestionSetId,
    SignupForm, Strand, StrandResults, UserId, VerificationToken,
};

use super::{ActiveDataset, AssessmentApi, LoginRequest, SavedAnswer};
use crate::error::ApiError;

/// Names each backend call so tests can fail or count it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    Login,
    CheckSession,
    CurrentUser,
    ActiveDataset,
    Courses,
    QuestionSet,
    ExistingAssessment,
    SavedAnswers,
    CreateAssessment,
    SaveAnswer,
    Submit,
    DeleteAssessment,
    Results,
    Signup,
    VerifyEmail,
    ResendSignupOtp,
    RequestPasswordReset,
    ResetPassword,
}

/// A code that was mailed and not yet used, keyed by its verification token.
#[derive(Debug, Clone)]
enum PendingCode {
    Signup { form: SignupForm, otp: String },
    Reset { email: String, otp: String },
}

impl PendingCode {
    fn otp(&self) -> &str {
        match self {
            Self::Signup { otp, .. } | Self::Reset { otp, .. } => otp,
        }
    }
}

#[derive(Debug, Clone)]
struct Attempt {
    user: UserId,
    data_set: DataSetId,
    is_first_year: Option<bool>,
    course: Option<CourseId>,
    answers: BTreeMap<QuestionId, AnswerValue>,
    completed: bool,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, (String, UserId)>,
    tokens: HashMap<String, UserId>,
    active: ActiveDataset,
    question_sets: HashMap<QuestionSetId, Vec<Question>>,
    courses: Vec<Course>,
    attempts: HashMap<AssessmentId, Attempt>,
    next_assessment: u64,
    failing: HashSet<ApiCall>,
    calls: Vec<ApiCall>,
    results: Option<StrandResults>,
    pending: HashMap<String, PendingCode>,
    outbox: HashMap<String, String>,
    sent_codes: u32,
}

impl State {
    fn enter(&mut self, call: ApiCall) -> Result<(), ApiError> {
        self.calls.push(call);
        if self.failing.contains(&call) {
            return Err(ApiError::Simulated("call configured to fail"));
        }
        Ok(())
    }

    fn user(&self, token: &AuthToken) -> Result<UserId, ApiError> {
        self.tokens
            .get(token.expose())
            .copied()
            .ok_or(ApiError::Unauthorized)
    }

    fn owned_attempt(
        &mut self,
        token: &AuthToken,
        id: AssessmentId,
    ) -> Result<&mut Attempt, ApiError> {
        let user = self.user(token)?;
        match self.attempts.get_mut(&id) {
            Some(attempt) if attempt.user == user => Ok(attempt),
            _ => Err(ApiError::NotFound),
        }
    }

    fn question_count(&self, data_set: DataSetId) -> usize {
        if self.active.data_set_id != Some(data_set) {
            return 0;
        }
        self.active
            .question_set_id
            .and_then(|id| self.question_sets.get(&id))
            .map_or(0, Vec::len)
    }

    /// "Mails" a fresh code to `email` and returns the token that guards it.
    fn send_code(
        &mut self,
        email: &str,
        pending: impl FnOnce(String) -> PendingCode,
    ) -> String {
        self.sent_codes += 1;
        let otp = format!("{:06}", 246_800 + self.sent_codes);
        self.outbox.insert(email.to_string(), otp.clone());
        let token = uuid::Uuid::new_v4().to_string();
        self.pending.insert(token.clone(), pending(otp));
        token
    }

    /// Consume the code behind `token` if it is of the expected `kind` and
    /// matches `otp`. A wrong code leaves it in place for another try.
    fn take_verified(
        &mut self,
        token: &VerificationToken,
        otp: &OtpCode,
        kind: fn(&PendingCode) -> bool,
    ) -> Result<PendingCode, ApiError> {
        let Some(pending) = self.pending.get(token.expose()).filter(|code| kind(code)) else {
            return Err(ApiError::Unauthorized);
        };
        if pending.otp() != otp.as_str() {
            return Err(ApiError::Rejected("Invalid OTP".to_string()));
        }
        self.pending
            .remove(token.expose())
            .ok_or(ApiError::Unauthorized)
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress_of(&self, attempt: &Attempt) -> Progress {
        if attempt.completed {
            return Progress::COMPLETE;
        }
        let total = self.question_count(attempt.data_set);
        if total == 0 {
            return Progress::NONE;
        }
        Progress::new(attempt.answers.len() as f64 / total as f64 * 100.0)
    }
}

/// In-process backend with the same contract as the REST service.
///
/// Used by tests and by offline mode. Progress is answered / total * 100.
#[derive(Clone, Default)]
pub struct InMemoryAssessmentApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryAssessmentApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ready-to-use backend: one account, 45 statements, three courses.
    #[must_use]
    pub fn demo() -> Self {
        let questions = (1..=45)
            .map(|id| Question::new(QuestionId::new(id), demo_statement(id)))
            .collect();
        Self::new()
            .with_account("student@strandify.test", "password", UserId::new(1))
            .with_dataset(DataSetId::new(1), QuestionSetId::new(1), questions)
            .with_courses(vec![
                Course::new(CourseId::new(1), "BS Computer Science"),
                Course::new(CourseId::new(2), "BS Accountancy"),
                Course::new(CourseId::new(3), "AB Communication"),
            ])
    }

    #[must_use]
    pub fn with_account(self, email: &str, password: &str, user: UserId) -> Self {
        self.edit(|state| {
            state
                .accounts
                .insert(email.to_ascii_lowercase(), (password.to_string(), user));
        });
        self
    }

    #[must_use]
    pub fn with_dataset(
        self,
        data_set: DataSetId,
        question_set: QuestionSetId,
        questions: Vec<Question>,
    ) -> Self {
        self.edit(|state| {
            state.active = ActiveDataset {
                data_set_id: Some(data_set),
                question_set_id: Some(question_set),
            };
            state.question_sets.insert(question_set, questions);
        });
        self
    }

    #[must_use]
    pub fn with_courses(self, courses: Vec<Course>) -> Self {
        self.edit(|state| state.courses = courses);
        self
    }

    #[must_use]
    pub fn with_results(self, results: StrandResults) -> Self {
        self.edit(|state| state.results = Some(results));
        self
    }

    /// Replace what `/active-dataset` reports.
    pub fn set_active_dataset(&self, active: ActiveDataset) {
        self.edit(|state| state.active = active);
    }

    /// Hand out a token for `user` without going through `/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Simulated` if the backend state is unusable.
    pub fn issue_token(&self, user: UserId) -> Result<AuthToken, ApiError> {
        let token = AuthToken::new(uuid::Uuid::new_v4().to_string())
            .ok_or(ApiError::Simulated("generated a blank token"))?;
        self.lock()?.tokens.insert(token.expose().to_string(), user);
        Ok(token)
    }

    /// Every issued token now answers 401.
    pub fn revoke_tokens(&self) {
        self.edit(|state| state.tokens.clear());
    }

    /// Store an attempt directly, e.g. one whose pre-survey was never saved.
    #[must_use]
    pub fn seed_attempt(
        &self,
        user: UserId,
        data_set: DataSetId,
        is_first_year: Option<bool>,
        course: Option<CourseId>,
        answers: &[(QuestionId, AnswerValue)],
    ) -> AssessmentId {
        let mut id = AssessmentId::new(0);
        self.edit(|state| {
            state.next_assessment += 1;
            id = AssessmentId::new(state.next_assessment);
            state.attempts.insert(
                id,
                Attempt {
                    user,
                    data_set,
                    is_first_year,
                    course,
                    answers: answers.iter().copied().collect(),
                    completed: false,
                },
            );
        });
        id
    }

    pub fn fail(&self, call: ApiCall) {
        self.edit(|state| {
            state.failing.insert(call);
        });
    }

    pub fn recover(&self, call: ApiCall) {
        self.edit(|state| {
            state.failing.remove(&call);
        });
    }

    /// How many times `call` was made, failed or not.
    #[must_use]
    pub fn count(&self, call: ApiCall) -> usize {
        self.read(|state| state.calls.iter().filter(|c| **c == call).count())
    }

    #[must_use]
    pub fn attempt_exists(&self, id: AssessmentId) -> bool {
        self.read(|state| state.attempts.contains_key(&id))
    }

    /// Answers the backend holds for `id`, in question order.
    #[must_use]
    pub fn stored_answers(&self, id: AssessmentId) -> Vec<(QuestionId, AnswerValue)> {
        self.read(|state| {
            state
                .attempts
                .get(&id)
                .map(|a| a.answers.iter().map(|(q, v)| (*q, *v)).collect())
                .unwrap_or_default()
        })
    }

    /// The last code "mailed" to `email`, standing in for the inbox.
    #[must_use]
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.read(|state| state.outbox.get(&email.trim().to_ascii_lowercase()).cloned())
    }

    #[must_use]
    pub fn has_account(&self, email: &str) -> bool {
        self.read(|state| state.accounts.contains_key(&email.trim().to_ascii_lowercase()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        self.state
            .lock()
            .map_err(|_| ApiError::Simulated("backend state lock poisoned"))
    }

    fn edit(&self, f: impl FnOnce(&mut State)) {
        if let Ok(mut guard) = self.lock() {
            f(&mut guard);
        }
    }

    fn read<T: Default>(&self, f: impl FnOnce(&State) -> T) -> T {
        self.lock().map(|guard| f(&guard)).unwrap_or_default()
    }
}

fn demo_statement(id: u64) -> String {
    const TOPICS: [&str; 3] = [
        "solving problems with numbers and experiments",
        "writing, debating, and learning about people",
        "planning budgets and running a small business",
    ];
    let topic = TOPICS[usize::try_from(id % 3).unwrap_or(0)];
    format!("Statement {id}: I enjoy {topic}.")
}

fn default_results(id: AssessmentId) -> StrandResults {
    StrandResults {
        results_id: id.value(),
        recommended_strand: Strand::Stem,
        stem_score: None,
        humss_score: None,
        abm_score: None,
        recommendation_description: None,
        dataset_name: None,
        created_at: None,
        neighbors: Vec::new(),
        tie_info: None,
    }
}

#[async_trait]
impl AssessmentApi for InMemoryAssessmentApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthToken, ApiError> {
        let user = {
            let mut state = self.lock()?;
            state.enter(ApiCall::Login)?;
            match state.accounts.get(&request.email.trim().to_ascii_lowercase()) {
                Some((password, user)) if *password == request.password => *user,
                _ => {
                    return Err(ApiError::LoginRejected(
                        "Invalid email or password".to_string(),
                    ));
                }
            }
        };
        self.issue_token(user)
    }

    async fn check_session(&self, token: &AuthToken) -> Result<bool, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::CheckSession)?;
        Ok(state.user(token).is_ok())
    }

    async fn current_user(&self, token: &AuthToken) -> Result<UserId, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::CurrentUser)?;
        state.user(token)
    }

    async fn active_dataset(&self, token: &AuthToken) -> Result<ActiveDataset, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::ActiveDataset)?;
        state.user(token)?;
        Ok(state.active)
    }

    async fn courses(&self, _token: &AuthToken) -> Result<Vec<Course>, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::Courses)?;
        Ok(state.courses.clone())
    }

    async fn question_set(
        &self,
        _token: &AuthToken,
        id: QuestionSetId,
    ) -> Result<Option<QuestionSet>, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::QuestionSet)?;
        Ok(state
            .question_sets
            .get(&id)
            .map(|questions| QuestionSet::new(id, questions.clone())))
    }

    async fn existing_assessment(
        &self,
        token: &AuthToken,
        user: UserId,
        data_set: DataSetId,
    ) -> Result<Option<ExistingAssessment>, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::ExistingAssessment)?;
        if state.user(token)? != user {
            return Err(ApiError::Unauthorized);
        }
        let found = state
            .attempts
            .iter()
            .filter(|(_, a)| a.user == user && a.data_set == data_set)
            .max_by_key(|(id, _)| **id)
            .map(|(id, attempt)| ExistingAssessment {
                assessment_id: *id,
                progress: state.progress_of(attempt),
                completed: attempt.completed,
                is_first_year: attempt.is_first_year,
                course_id: attempt.course,
            });
        Ok(found)
    }

    async fn saved_answers(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<Vec<SavedAnswer>, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::SavedAnswers)?;
        let attempt = state.owned_attempt(token, assessment)?;
        Ok(attempt
            .answers
            .iter()
            .map(|(question, value)| SavedAnswer {
                question_id: *question,
                answer_value: i64::from(value.value()),
            })
            .collect())
    }

    async fn create_assessment(
        &self,
        token: &AuthToken,
        request: &NewAssessment,
    ) -> Result<AssessmentId, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::CreateAssessment)?;
        if state.user(token)? != request.user_id {
            return Err(ApiError::Unauthorized);
        }
        state.next_assessment += 1;
        let id = AssessmentId::new(state.next_assessment);
        state.attempts.insert(
            id,
            Attempt {
                user: request.user_id,
                data_set: request.data_set_id,
                is_first_year: Some(request.is_first_year),
                course: request.course_id,
                answers: BTreeMap::new(),
                completed: false,
            },
        );
        Ok(id)
    }

    async fn save_answer(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<Option<Progress>, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::SaveAnswer)?;
        let attempt = state.owned_attempt(token, assessment)?;
        attempt.answers.insert(question, value);
        let snapshot = attempt.clone();
        Ok(Some(state.progress_of(&snapshot)))
    }

    async fn submit(&self, token: &AuthToken, assessment: AssessmentId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::Submit)?;
        state.owned_attempt(token, assessment)?.completed = true;
        Ok(())
    }

    async fn delete_assessment(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::DeleteAssessment)?;
        state.owned_attempt(token, assessment)?;
        state.attempts.remove(&assessment);
        Ok(())
    }

    async fn results(
        &self,
        token: &AuthToken,
        assessment: AssessmentId,
    ) -> Result<StrandResults, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::Results)?;
        if !state.owned_attempt(token, assessment)?.completed {
            return Err(ApiError::Locked);
        }
        Ok(state
            .results
            .clone()
            .unwrap_or_else(|| default_results(assessment)))
    }

    async fn signup(&self, form: &SignupForm) -> Result<VerificationToken, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::Signup)?;
        if form.validate().is_err() {
            return Err(ApiError::Rejected("All fields are required".to_string()));
        }
        let email = form.email.trim().to_ascii_lowercase();
        if state.accounts.contains_key(&email) {
            return Err(ApiError::Rejected("Email already registered".to_string()));
        }
        let form = form.clone();
        let token = state.send_code(&email, |otp| PendingCode::Signup { form, otp });
        VerificationToken::new(token).ok_or(ApiError::Simulated("generated a blank token"))
    }

    async fn verify_email(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
    ) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::VerifyEmail)?;
        let verified = state.take_verified(pending, otp, |code| {
            matches!(code, PendingCode::Signup { .. })
        })?;
        let PendingCode::Signup { form, .. } = verified else {
            return Err(ApiError::Unauthorized);
        };
        let next = state.accounts.values().map(|(_, id)| id.value()).max().unwrap_or(0) + 1;
        state.accounts.insert(
            form.email.trim().to_ascii_lowercase(),
            (form.password, UserId::new(next)),
        );
        Ok(())
    }

    async fn resend_signup_otp(
        &self,
        pending: &VerificationToken,
    ) -> Result<VerificationToken, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::ResendSignupOtp)?;
        let form = match state.pending.get(pending.expose()) {
            Some(PendingCode::Signup { form, .. }) => form.clone(),
            _ => return Err(ApiError::Unauthorized),
        };
        state.pending.remove(pending.expose());
        let email = form.email.trim().to_ascii_lowercase();
        let token = state.send_code(&email, |otp| PendingCode::Signup { form, otp });
        VerificationToken::new(token).ok_or(ApiError::Simulated("generated a blank token"))
    }

    async fn request_password_reset(&self, email: &str) -> Result<VerificationToken, ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::RequestPasswordReset)?;
        let email = email.trim().to_ascii_lowercase();
        if !state.accounts.contains_key(&email) {
            return Err(ApiError::Rejected("User not found".to_string()));
        }
        // A new request voids any earlier reset code for the same address.
        state
            .pending
            .retain(|_, code| !matches!(code, PendingCode::Reset { email: e, .. } if *e == email));
        let token = state.send_code(&email, |otp| PendingCode::Reset {
            email: email.clone(),
            otp,
        });
        VerificationToken::new(token).ok_or(ApiError::Simulated("generated a blank token"))
    }

    async fn reset_password(
        &self,
        pending: &VerificationToken,
        otp: &OtpCode,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.enter(ApiCall::ResetPassword)?;
        let verified = state.take_verified(pending, otp, |code| {
            matches!(code, PendingCode::Reset { .. })
        })?;
        let PendingCode::Reset { email, .. } = verified else {
            return Err(ApiError::Unauthorized);
        };
        let account = state
            .accounts
            .get_mut(&email)
            .ok_or_else(|| ApiError::Rejected("User not found".to_string()))?;
        account.0 = new_password.to_string();
        Ok(())
    }
}
