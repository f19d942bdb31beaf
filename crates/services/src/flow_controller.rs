//! Drives `AssessmentFlow` against the backend.
//!
//! The controller owns the "not loaded yet" and terminal outcomes that the
//! core state machine leaves out, and turns each user action into the
//! matching backend call.

use std::sync::Arc;

use strand_core::flow::{AnswerTicket, AssessmentFlow, FlowContext, FlowError, FlowState};
use strand_core::model::{
    AnswerValue, AuthToken, Course, CourseId, ExistingAssessment, Progress, QuestionId,
};
use strand_core::{
    LeaveDecision, LeaveSignal, NavTarget, PageAdvance, PageNumber, StartPlan, SubmitGate,
};

use crate::api::{AssessmentApi, SavedAnswer};
use crate::auth_service::AuthService;
use crate::error::{ApiError, ControllerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    NoActiveDataset,
    NoQuestionSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerStatus {
    Uninitialized,
    Ready(AssessmentFlow),
    /// Token missing, rejected, or the initial fetch failed.
    MustReauthenticate,
    Halted(HaltReason),
}

/// Where a retake was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetakeOrigin {
    /// From the assessment view: go straight back to the pre-survey.
    InFlow,
    /// From the dashboard: reload everything on the next visit.
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Blocked(QuestionId),
}

/// A pending background save for one answer.
pub struct AnswerWrite {
    api: Arc<dyn AssessmentApi>,
    token: AuthToken,
    ticket: AnswerTicket,
}

impl AnswerWrite {
    #[must_use]
    pub fn ticket(&self) -> &AnswerTicket {
        &self.ticket
    }

    /// Send the answer. Failures are logged and yield an ack without progress.
    pub async fn persist(self) -> AnswerAck {
        let ticket = self.ticket;
        let progress = match self
            .api
            .save_answer(&self.token, ticket.assessment_id, ticket.question, ticket.value)
            .await
        {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(
                    assessment = %ticket.assessment_id,
                    question = %ticket.question,
                    error = %err,
                    "failed to save answer"
                );
                None
            }
        };
        AnswerAck { ticket, progress }
    }
}

/// Backend answer to one [`AnswerWrite`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerAck {
    pub ticket: AnswerTicket,
    pub progress: Option<Progress>,
}

enum LoadFailure {
    Api(ApiError),
    Halt(HaltReason),
}

impl From<ApiError> for LoadFailure {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

pub struct FlowController {
    api: Arc<dyn AssessmentApi>,
    auth: Arc<AuthService>,
    page_size: usize,
    status: ControllerStatus,
    courses: Vec<Course>,
    token: Option<AuthToken>,
}

impl FlowController {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, auth: Arc<AuthService>, page_size: usize) -> Self {
        Self {
            api,
            auth,
            page_size: page_size.max(1),
            status: ControllerStatus::Uninitialized,
            courses: Vec::new(),
            token: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> &ControllerStatus {
        &self.status
    }

    #[must_use]
    pub fn flow(&self) -> Option<&AssessmentFlow> {
        match &self.status {
            ControllerStatus::Ready(flow) => Some(flow),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.flow().map_or(FlowState::Uninitialized, AssessmentFlow::state)
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    fn flow_mut(&mut self) -> Result<&mut AssessmentFlow, ControllerError> {
        match &mut self.status {
            ControllerStatus::Ready(flow) => Ok(flow),
            _ => Err(ControllerError::NotReady),
        }
    }

    fn token(&self) -> Result<AuthToken, ControllerError> {
        self.token.clone().ok_or(ControllerError::NotReady)
    }

    /// Fetch user, dataset, courses, questions and any existing attempt.
    pub async fn initialize(&mut self) -> &ControllerStatus {
        let token = match self.auth.current_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::info!("no stored token; login required");
                self.status = ControllerStatus::MustReauthenticate;
                return &self.status;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored token");
                self.status = ControllerStatus::MustReauthenticate;
                return &self.status;
            }
        };

        self.status = match self.load(&token).await {
            Ok(flow) => {
                tracing::info!(
                    state = ?flow.state(),
                    questions = flow.questions().len(),
                    answered = flow.answers().len(),
                    "assessment loaded"
                );
                self.token = Some(token);
                ControllerStatus::Ready(flow)
            }
            Err(LoadFailure::Halt(reason)) => {
                tracing::error!(?reason, "assessment prerequisites missing");
                ControllerStatus::Halted(reason)
            }
            Err(LoadFailure::Api(err)) => {
                tracing::warn!(error = %err, "initial assessment fetch failed");
                if err.is_auth() {
                    if let Err(clear) = self.auth.expire_session().await {
                        tracing::warn!(error = %clear, "failed to clear rejected token");
                    }
                }
                ControllerStatus::MustReauthenticate
            }
        };
        &self.status
    }

    async fn load(&mut self, token: &AuthToken) -> Result<AssessmentFlow, LoadFailure> {
        let user_id = self.api.current_user(token).await?;
        let active = self.api.active_dataset(token).await?;
        let data_set_id = active
            .data_set_id
            .ok_or(LoadFailure::Halt(HaltReason::NoActiveDataset))?;

        self.courses = self.api.courses(token).await?;

        let question_set_id = active
            .question_set_id
            .ok_or(LoadFailure::Halt(HaltReason::NoQuestionSet))?;
        let questions = self
            .api
            .question_set(token, question_set_id)
            .await?
            .filter(|set| !set.is_empty())
            .ok_or(LoadFailure::Halt(HaltReason::NoQuestionSet))?;

        let context = FlowContext {
            user_id,
            data_set_id,
            questions,
            page_size: self.page_size,
        };

        let existing = self
            .api
            .existing_assessment(token, user_id, data_set_id)
            .await?;
        let flow = match existing {
            Some(existing) => self.resume(token, context, &existing).await?,
            None => AssessmentFlow::fresh(context).map_err(halt_for)?,
        };
        Ok(flow)
    }

    async fn resume(
        &self,
        token: &AuthToken,
        context: FlowContext,
        existing: &ExistingAssessment,
    ) -> Result<AssessmentFlow, LoadFailure> {
        let saved = self
            .api
            .saved_answers(token, existing.assessment_id)
            .await?;
        let answers = saved.into_iter().filter_map(|row: SavedAnswer| {
            row.into_pair()
                .map_err(|err| {
                    tracing::warn!(question = %row.question_id, error = %err, "skipping saved answer");
                })
                .ok()
        });
        AssessmentFlow::resume(context, existing, answers).map_err(halt_for)
    }

    // ─── Pre-survey ──────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ControllerError::NotReady` or `ControllerError::Flow`.
    pub fn answer_first_year(&mut self, is_first_year: bool) -> Result<(), ControllerError> {
        Ok(self.flow_mut()?.answer_first_year(is_first_year)?)
    }

    /// # Errors
    ///
    /// Returns `ControllerError::NotReady` or `ControllerError::Flow`.
    pub fn select_course(&mut self, course: Option<CourseId>) -> Result<(), ControllerError> {
        Ok(self.flow_mut()?.select_course(course)?)
    }

    /// Create or reuse the attempt and move to page 1.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Start` when the create call fails; the flow
    /// stays in the pre-survey so the user can retry.
    pub async fn start(&mut self) -> Result<(), ControllerError> {
        let token = self.token()?;
        let plan = self.flow_mut()?.start_plan()?;
        let assessment_id = match plan {
            StartPlan::Reuse(id) => id,
            StartPlan::Create(request) => self
                .api
                .create_assessment(&token, &request)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, "failed to start assessment");
                    ControllerError::Start(err)
                })?,
        };
        self.flow_mut()?.begin(assessment_id)?;
        tracing::info!(assessment = %assessment_id, "assessment started");
        Ok(())
    }

    // ─── Answers ─────────────────────────────────────────────────────────────

    /// Record locally and return the background write to run.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Flow` outside `InProgress` or for unknown ids.
    pub fn record_answer(
        &mut self,
        question: QuestionId,
        value: AnswerValue,
    ) -> Result<AnswerWrite, ControllerError> {
        let token = self.token()?;
        let ticket = self.flow_mut()?.record_answer(question, value)?;
        Ok(AnswerWrite {
            api: Arc::clone(&self.api),
            token,
            ticket,
        })
    }

    /// Apply backend progress; `false` when the ack was stale or empty.
    pub fn apply_ack(&mut self, ack: &AnswerAck) -> bool {
        let Some(progress) = ack.progress else {
            return false;
        };
        match self.flow_mut() {
            Ok(flow) => flow.acknowledge(&ack.ticket, progress),
            Err(_) => false,
        }
    }

    /// Apply acks that arrived while the controller was busy elsewhere, in
    /// arrival order. `true` if any of them moved the flow.
    pub fn apply_acks(&mut self, acks: impl IntoIterator<Item = AnswerAck>) -> bool {
        acks.into_iter()
            .fold(false, |applied, ack| self.apply_ack(&ack) || applied)
    }

    // ─── Paging ──────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `ControllerError::Flow` outside `InProgress`.
    pub fn next_page(&mut self) -> Result<PageAdvance, ControllerError> {
        Ok(self.flow_mut()?.next_page()?)
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Flow` outside `InProgress`.
    pub fn previous_page(&mut self) -> Result<Option<PageNumber>, ControllerError> {
        Ok(self.flow_mut()?.previous_page()?)
    }

    #[must_use]
    pub fn leave_decision(&self, signal: LeaveSignal) -> LeaveDecision {
        self.flow()
            .map_or(LeaveDecision::Allow, |flow| flow.leave_decision(signal))
    }

    // ─── Submission ──────────────────────────────────────────────────────────

    /// Validate the last page and submit once.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Submit` when the backend call fails; the flow
    /// is back on the same page and may be submitted again.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ControllerError> {
        let token = self.token()?;
        let assessment_id = match self.flow_mut()?.begin_submit()? {
            SubmitGate::Blocked(question) => return Ok(SubmitOutcome::Blocked(question)),
            SubmitGate::Ready(id) => id,
        };

        tracing::info!(assessment = %assessment_id, "submitting assessment");
        match self.api.submit(&token, assessment_id).await {
            Ok(()) => {
                self.flow_mut()?.submit_succeeded()?;
                tracing::info!(assessment = %assessment_id, "assessment completed");
                Ok(SubmitOutcome::Completed)
            }
            Err(err) => {
                self.flow_mut()?.submit_failed()?;
                tracing::error!(assessment = %assessment_id, error = %err, "submit failed");
                Err(ControllerError::Submit(err))
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Flow` before completion.
    pub fn confirm_completion(&self) -> Result<NavTarget, ControllerError> {
        let flow = self.flow().ok_or(ControllerError::NotReady)?;
        Ok(flow.confirm_completion()?)
    }

    // ─── Retake ──────────────────────────────────────────────────────────────

    /// Delete the attempt server-side and reset local state.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Retake` if the delete fails; nothing local
    /// changes in that case.
    pub async fn retake(&mut self, origin: RetakeOrigin) -> Result<(), ControllerError> {
        let token = self.token()?;
        let previous = self.flow_mut()?.assessment_id();
        if let Some(id) = previous {
            self.api
                .delete_assessment(&token, id)
                .await
                .map_err(ControllerError::Retake)?;
        }

        match origin {
            RetakeOrigin::InFlow => {
                self.flow_mut()?.reset_for_retake();
            }
            RetakeOrigin::Dashboard => {
                self.status = ControllerStatus::Uninitialized;
                self.token = None;
            }
        }
        tracing::info!(?previous, ?origin, "assessment reset for retake");
        Ok(())
    }
}

fn halt_for(err: FlowError) -> LoadFailure {
    tracing::error!(error = %err, "could not build assessment flow");
    LoadFailure::Halt(HaltReason::NoQuestionSet)
}
