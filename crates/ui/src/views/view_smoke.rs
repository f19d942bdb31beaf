use services::InMemoryAssessmentApi;
use services::api::ActiveDataset;
use strand_core::model::{AnswerValue, DataSetId, QuestionId, UserId};

use super::test_harness::{ViewKind, setup_view_harness};
use crate::vm::SESSION_EXPIRED_MESSAGE;

fn answered(count: u64) -> Vec<(QuestionId, AnswerValue)> {
    (1..=count)
        .map(|id| (QuestionId::new(id), AnswerValue::new(4).unwrap()))
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn login_view_smoke_renders_form() {
    let mut harness =
        setup_view_harness(ViewKind::Login, InMemoryAssessmentApi::demo(), false).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Remember me"), "missing remember me in {html}");
    assert!(html.contains("Sign in"), "missing submit button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn login_view_smoke_links_to_account_recovery() {
    let mut harness =
        setup_view_harness(ViewKind::Login, InMemoryAssessmentApi::demo(), false).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Forgot password?"), "missing reset link in {html}");
    assert!(html.contains("Create an account"), "missing signup link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn signup_view_smoke_renders_form() {
    let mut harness =
        setup_view_harness(ViewKind::Signup, InMemoryAssessmentApi::demo(), false).await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Create your account"), "missing heading in {html}");
    assert!(html.contains("signup-birthday"), "missing birthday in {html}");
    assert!(html.contains("Confirm password"), "missing confirmation in {html}");
    assert!(!html.contains("otp-code"), "code entry shown before sending in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn forgot_password_view_smoke_asks_for_email_first() {
    let mut harness =
        setup_view_harness(ViewKind::ForgotPassword, InMemoryAssessmentApi::demo(), false)
            .await;
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Reset your password"), "missing heading in {html}");
    assert!(html.contains("Send Code"), "missing send button in {html}");
    assert!(!html.contains("New password"), "password boxes shown too early in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn shell_smoke_clears_a_rejected_token() {
    let api = InMemoryAssessmentApi::demo();
    let mut harness = setup_view_harness(ViewKind::Shell, api.clone(), true).await;
    assert!(harness.app.auth().current_token().await.unwrap().is_some());
    api.revoke_tokens();

    let html = harness.render_until(SESSION_EXPIRED_MESSAGE).await;
    assert!(html.contains(SESSION_EXPIRED_MESSAGE), "missing notice in {html}");
    assert!(html.contains("Dismiss"), "notice cannot be dismissed in {html}");
    for _ in 0..3 {
        harness.drive_async().await;
    }
    assert!(harness.app.auth().current_token().await.unwrap().is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_not_started() {
    let mut harness =
        setup_view_harness(ViewKind::Home, InMemoryAssessmentApi::demo(), true).await;
    let needle = "You have not taken the assessment yet.";
    let html = harness.render_until(needle).await;
    assert!(html.contains(needle), "missing {needle} in {html}");
    assert!(html.contains("Take Assessment"), "missing start link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_results_for_completed_attempt() {
    let api = InMemoryAssessmentApi::demo();
    let id = api.seed_attempt(UserId::new(1), DataSetId::new(1), Some(false), None, &answered(45));
    let token = api.issue_token(UserId::new(1)).unwrap();
    services::AssessmentApi::submit(&api, &token, id).await.unwrap();

    let mut harness = setup_view_harness(ViewKind::Home, api, true).await;
    let html = harness.render_until("Recommended Strand").await;
    assert!(html.contains("Recommended Strand"), "missing summary in {html}");
    assert!(html.contains("STEM"), "missing strand in {html}");
    assert!(html.contains("Retake Assessment"), "missing retake in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_smoke_starts_at_pre_survey() {
    let mut harness =
        setup_view_harness(ViewKind::Assessment, InMemoryAssessmentApi::demo(), true).await;
    let needle = "Are you a first-year college student?";
    let html = harness.render_until(needle).await;
    assert!(html.contains(needle), "missing pre-survey in {html}");
    assert!(html.contains("Start Assessment"), "missing start button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_smoke_resumes_on_first_page() {
    let api = InMemoryAssessmentApi::demo();
    let _ = api.seed_attempt(UserId::new(1), DataSetId::new(1), Some(false), None, &answered(9));

    let mut harness = setup_view_harness(ViewKind::Assessment, api, true).await;
    let html = harness.render_until("Page 1 of 3").await;
    assert!(
        html.contains("Page 1 of 3 | Progress: 20%"),
        "missing status line in {html}"
    );
    assert!(html.contains("question-15"), "missing last question of page in {html}");
    assert!(!html.contains("question-16"), "page 2 leaked into page 1 in {html}");
    assert!(html.contains("Strongly Disagree"), "missing scale in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_smoke_reports_expired_session() {
    let mut harness =
        setup_view_harness(ViewKind::Assessment, InMemoryAssessmentApi::demo(), false).await;
    let html = harness.render_until(SESSION_EXPIRED_MESSAGE).await;
    assert!(html.contains(SESSION_EXPIRED_MESSAGE), "missing notice in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_smoke_halts_without_dataset() {
    let api = InMemoryAssessmentApi::demo();
    api.set_active_dataset(ActiveDataset::default());

    let mut harness = setup_view_harness(ViewKind::Assessment, api, true).await;
    let needle = "No assessment is open right now";
    let html = harness.render_until(needle).await;
    assert!(html.contains(needle), "missing halt notice in {html}");
}
