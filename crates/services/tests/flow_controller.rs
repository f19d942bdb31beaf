use std::sync::Arc;

use services::{
    ApiCall, AuthService, ControllerError, ControllerStatus, FlowController, HaltReason,
    InMemoryAssessmentApi, RetakeOrigin, SubmitOutcome,
};
use services::api::ActiveDataset;
use storage::repository::{Storage, TokenRecord};
use strand_core::flow::FlowState;
use strand_core::model::{
    AnswerValue, CourseId, DataSetId, Progress, QuestionId, QuestionSetId, TokenScope, UserId,
};
use strand_core::time::fixed_now;
use strand_core::{Clock, LeaveDecision, LeaveSignal, NavTarget, PageAdvance, PageNumber};

const USER: UserId = UserId::new(1);
const DATASET: DataSetId = DataSetId::new(1);

struct Harness {
    api: InMemoryAssessmentApi,
    storage: Storage,
    controller: FlowController,
}

async fn harness_with(api: InMemoryAssessmentApi) -> Harness {
    let storage = Storage::in_memory();
    let token = api.issue_token(USER).unwrap();
    storage
        .session
        .save_token(&TokenRecord::new(token, TokenScope::Session, fixed_now()))
        .await
        .unwrap();
    let auth = Arc::new(AuthService::new(Clock::fixed(fixed_now()), storage.clone()));
    let controller = FlowController::new(Arc::new(api.clone()), auth, 15);
    Harness {
        api,
        storage,
        controller,
    }
}

async fn harness() -> Harness {
    harness_with(InMemoryAssessmentApi::demo()).await
}

fn value(v: i64) -> AnswerValue {
    AnswerValue::new(v).unwrap()
}

async fn answer(controller: &mut FlowController, question: u64, v: i64) -> bool {
    let write = controller
        .record_answer(QuestionId::new(question), value(v))
        .unwrap();
    let ack = write.persist().await;
    controller.apply_ack(&ack)
}

async fn start_fresh(h: &mut Harness) {
    h.controller.initialize().await;
    h.controller.answer_first_year(false).unwrap();
    h.controller.start().await.unwrap();
}

fn page(controller: &FlowController) -> usize {
    controller
        .flow()
        .and_then(|flow| flow.current_page())
        .map(PageNumber::get)
        .unwrap()
}

#[tokio::test]
async fn forty_five_question_walkthrough() {
    let mut h = harness().await;
    h.controller.initialize().await;
    assert_eq!(h.controller.state(), FlowState::PreSurvey);
    assert_eq!(h.controller.courses().len(), 3);
    assert_eq!(h.controller.flow().unwrap().total_pages(), 3);

    // First-year students must pick a course before starting.
    h.controller.answer_first_year(true).unwrap();
    assert!(!h.controller.flow().unwrap().can_start());
    h.controller.select_course(Some(CourseId::new(1))).unwrap();
    assert!(h.controller.flow().unwrap().can_start());
    h.controller.start().await.unwrap();
    assert_eq!(h.controller.state(), FlowState::InProgress);
    assert_eq!(h.api.count(ApiCall::CreateAssessment), 1);

    for q in 1..=15 {
        assert!(answer(&mut h.controller, q, 4).await);
    }
    assert_eq!(
        h.controller.next_page().unwrap(),
        PageAdvance::Advanced(PageNumber::new(2).unwrap())
    );

    for q in (16..=30).filter(|q| *q != 23) {
        answer(&mut h.controller, q, 2).await;
    }
    assert_eq!(
        h.controller.next_page().unwrap(),
        PageAdvance::Blocked(QuestionId::new(23))
    );
    assert_eq!(page(&h.controller), 2);
    assert_eq!(
        h.controller.flow().unwrap().flagged(),
        Some(QuestionId::new(23))
    );

    answer(&mut h.controller, 23, 5).await;
    assert_eq!(h.controller.flow().unwrap().flagged(), None);
    assert_eq!(
        h.controller.next_page().unwrap(),
        PageAdvance::Advanced(PageNumber::new(3).unwrap())
    );

    for q in 31..=45 {
        answer(&mut h.controller, q, 3).await;
    }
    assert_eq!(h.controller.next_page().unwrap(), PageAdvance::LastPage);
    assert_eq!(
        h.controller.flow().unwrap().progress().rounded(),
        100,
        "backend reports every answer saved"
    );

    assert_eq!(h.controller.submit().await.unwrap(), SubmitOutcome::Completed);
    assert_eq!(h.controller.state(), FlowState::Completed);
    assert_eq!(h.api.count(ApiCall::Submit), 1);
    assert_eq!(
        h.controller.confirm_completion().unwrap(),
        NavTarget::DashboardHome
    );
    assert!(h.controller.record_answer(QuestionId::new(1), value(1)).is_err());
}

#[tokio::test]
async fn resume_restores_saved_answers_and_skips_pre_survey() {
    let api = InMemoryAssessmentApi::demo();
    let saved: Vec<_> = (1..=7).map(|q| (QuestionId::new(q), value(3))).collect();
    let id = api.seed_attempt(USER, DATASET, Some(false), None, &saved);
    let mut h = harness_with(api).await;

    h.controller.initialize().await;
    let flow = h.controller.flow().unwrap();
    assert_eq!(flow.state(), FlowState::InProgress);
    assert_eq!(flow.assessment_id(), Some(id));
    assert_eq!(flow.answers().len(), 7);
    assert_eq!(flow.answers().entries().collect::<Vec<_>>(), saved);
    assert_eq!(flow.progress(), Progress::new(7.0 / 45.0 * 100.0));
    assert_eq!(h.api.count(ApiCall::SavedAnswers), 1);
    assert_eq!(h.api.count(ApiCall::CreateAssessment), 0);
}

#[tokio::test]
async fn attempt_without_pre_survey_reuses_its_id() {
    let api = InMemoryAssessmentApi::demo();
    let id = api.seed_attempt(USER, DATASET, None, None, &[]);
    let mut h = harness_with(api).await;

    h.controller.initialize().await;
    assert_eq!(h.controller.state(), FlowState::PreSurvey);
    h.controller.answer_first_year(false).unwrap();
    h.controller.start().await.unwrap();
    assert_eq!(h.controller.flow().unwrap().assessment_id(), Some(id));
    assert_eq!(h.api.count(ApiCall::CreateAssessment), 0);
}

#[tokio::test]
async fn retake_in_flow_writes_to_a_new_attempt() {
    let mut h = harness().await;
    start_fresh(&mut h).await;
    answer(&mut h.controller, 1, 5).await;
    let old = h.controller.flow().unwrap().assessment_id().unwrap();

    h.controller.retake(RetakeOrigin::InFlow).await.unwrap();
    let flow = h.controller.flow().unwrap();
    assert_eq!(flow.state(), FlowState::PreSurvey);
    assert_eq!(flow.assessment_id(), None);
    assert!(flow.answers().is_empty());
    assert_eq!(flow.progress(), Progress::NONE);
    assert_eq!(flow.pre_survey().is_first_year(), None);
    assert!(!h.api.attempt_exists(old));

    h.controller.answer_first_year(false).unwrap();
    h.controller.start().await.unwrap();
    let write = h
        .controller
        .record_answer(QuestionId::new(2), value(1))
        .unwrap();
    assert_ne!(write.ticket().assessment_id, old);
    let new_id = write.ticket().assessment_id;
    write.persist().await;
    assert_eq!(h.api.stored_answers(new_id), vec![(QuestionId::new(2), value(1))]);
}

#[tokio::test]
async fn retake_from_dashboard_requires_reinitialize() {
    let mut h = harness().await;
    start_fresh(&mut h).await;

    h.controller.retake(RetakeOrigin::Dashboard).await.unwrap();
    assert_eq!(h.controller.status(), &ControllerStatus::Uninitialized);

    h.controller.initialize().await;
    assert_eq!(h.controller.state(), FlowState::PreSurvey);
}

#[tokio::test]
async fn rejected_token_forces_login_and_clears_storage() {
    let mut h = harness().await;
    h.api.revoke_tokens();

    let status = h.controller.initialize().await;
    assert_eq!(status, &ControllerStatus::MustReauthenticate);
    assert!(h.storage.session.load_token().await.unwrap().is_none());
}

#[tokio::test]
async fn network_failure_during_load_is_not_retryable() {
    let mut h = harness().await;
    h.api.fail(ApiCall::QuestionSet);

    assert_eq!(
        h.controller.initialize().await,
        &ControllerStatus::MustReauthenticate
    );
    // Only 401 clears the token.
    assert!(h.storage.session.load_token().await.unwrap().is_some());
}

#[tokio::test]
async fn missing_prerequisites_halt_the_flow() {
    let mut h = harness().await;
    h.api.set_active_dataset(ActiveDataset::default());
    assert_eq!(
        h.controller.initialize().await,
        &ControllerStatus::Halted(HaltReason::NoActiveDataset)
    );

    h.api.set_active_dataset(ActiveDataset {
        data_set_id: Some(DATASET),
        question_set_id: Some(QuestionSetId::new(99)),
    });
    assert_eq!(
        h.controller.initialize().await,
        &ControllerStatus::Halted(HaltReason::NoQuestionSet)
    );
}

#[tokio::test]
async fn start_failure_keeps_the_pre_survey() {
    let mut h = harness().await;
    h.controller.initialize().await;
    h.controller.answer_first_year(false).unwrap();
    h.api.fail(ApiCall::CreateAssessment);

    let err = h.controller.start().await.unwrap_err();
    assert!(matches!(err, ControllerError::Start(_)));
    assert_eq!(h.controller.state(), FlowState::PreSurvey);

    h.api.recover(ApiCall::CreateAssessment);
    h.controller.start().await.unwrap();
    assert_eq!(h.controller.state(), FlowState::InProgress);
}

#[tokio::test]
async fn submit_failure_returns_to_the_same_page() {
    let api = InMemoryAssessmentApi::demo();
    let saved: Vec<_> = (1..=45).map(|q| (QuestionId::new(q), value(4))).collect();
    api.seed_attempt(USER, DATASET, Some(false), None, &saved);
    let mut h = harness_with(api).await;
    h.controller.initialize().await;
    h.controller.next_page().unwrap();
    h.controller.next_page().unwrap();
    assert_eq!(page(&h.controller), 3);

    h.api.fail(ApiCall::Submit);
    let err = h.controller.submit().await.unwrap_err();
    assert!(matches!(err, ControllerError::Submit(_)));
    assert_eq!(h.controller.state(), FlowState::InProgress);
    assert_eq!(page(&h.controller), 3);

    h.api.recover(ApiCall::Submit);
    assert_eq!(h.controller.submit().await.unwrap(), SubmitOutcome::Completed);
    assert_eq!(h.api.count(ApiCall::Submit), 2);
}

#[tokio::test]
async fn ack_held_during_a_failed_submit_still_counts() {
    let api = InMemoryAssessmentApi::demo();
    let saved: Vec<_> = (1..=44).map(|q| (QuestionId::new(q), value(4))).collect();
    api.seed_attempt(USER, DATASET, Some(false), None, &saved);
    let mut h = harness_with(api).await;
    h.controller.initialize().await;
    h.controller.next_page().unwrap();
    h.controller.next_page().unwrap();

    let write = h
        .controller
        .record_answer(QuestionId::new(45), value(3))
        .unwrap();
    h.api.fail(ApiCall::Submit);
    assert!(h.controller.submit().await.is_err());

    // The save finished while the submit had the controller.
    let ack = write.persist().await;
    let flow = h.controller.flow().unwrap();
    assert!(flow.progress() < Progress::COMPLETE);

    assert!(h.controller.apply_acks(vec![ack]));
    assert_eq!(h.controller.flow().unwrap().progress(), Progress::COMPLETE);
    assert!(!h.controller.apply_acks(Vec::new()));
}

#[tokio::test]
async fn submit_is_gated_by_last_page_validation() {
    let api = InMemoryAssessmentApi::demo();
    let saved: Vec<_> = (1..=44).map(|q| (QuestionId::new(q), value(4))).collect();
    api.seed_attempt(USER, DATASET, Some(false), None, &saved);
    let mut h = harness_with(api).await;
    h.controller.initialize().await;
    h.controller.next_page().unwrap();
    h.controller.next_page().unwrap();

    assert_eq!(
        h.controller.submit().await.unwrap(),
        SubmitOutcome::Blocked(QuestionId::new(45))
    );
    assert_eq!(h.api.count(ApiCall::Submit), 0);
}

#[tokio::test]
async fn failed_background_save_keeps_the_selection() {
    let mut h = harness().await;
    start_fresh(&mut h).await;
    h.api.fail(ApiCall::SaveAnswer);

    assert!(!answer(&mut h.controller, 1, 5).await);
    let flow = h.controller.flow().unwrap();
    assert_eq!(flow.answers().get(QuestionId::new(1)), Some(value(5)));
    assert_eq!(flow.progress(), Progress::NONE);
}

#[tokio::test]
async fn only_the_latest_write_per_question_is_trusted() {
    let mut h = harness().await;
    start_fresh(&mut h).await;

    let first = h
        .controller
        .record_answer(QuestionId::new(1), value(2))
        .unwrap();
    let second = h
        .controller
        .record_answer(QuestionId::new(1), value(4))
        .unwrap();

    let second_ack = second.persist().await;
    let first_ack = first.persist().await;
    assert!(h.controller.apply_ack(&second_ack));
    assert!(!h.controller.apply_ack(&first_ack));
}

#[tokio::test]
async fn leave_guard_tracks_partial_progress() {
    let mut h = harness().await;
    start_fresh(&mut h).await;
    assert_eq!(
        h.controller.leave_decision(LeaveSignal::RouteChange),
        LeaveDecision::Allow
    );

    answer(&mut h.controller, 1, 3).await;
    for signal in [LeaveSignal::RouteChange, LeaveSignal::WindowClose] {
        assert!(h.controller.leave_decision(signal).needs_confirmation());
    }
}

#[tokio::test]
async fn completed_attempt_loads_as_completed() {
    let api = InMemoryAssessmentApi::demo();
    let id = api.seed_attempt(USER, DATASET, Some(false), None, &[]);
    let token = api.issue_token(USER).unwrap();
    services::AssessmentApi::submit(&api, &token, id).await.unwrap();

    let mut h = harness_with(api).await;
    h.controller.initialize().await;
    assert_eq!(h.controller.state(), FlowState::Completed);
    assert_eq!(
        h.controller.leave_decision(LeaveSignal::WindowClose),
        LeaveDecision::Allow
    );
}
