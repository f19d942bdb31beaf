use dioxus::prelude::*;
use dioxus_router::use_navigator;
use strand_core::model::AssessmentId;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{DashboardVm, ResultsVm};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let nav = use_navigator();
    let mut notice = use_signal(|| None::<&'static str>);

    let dashboard = ctx.dashboard();
    let resource = use_resource(move || {
        let dashboard = dashboard.clone();
        async move {
            dashboard
                .overview()
                .await
                .map(|overview| DashboardVm::from_overview(&overview))
                .map_err(|err| {
                    tracing::warn!(error = %err, "dashboard overview failed");
                    ViewError::from(&err)
                })
        }
    });
    let state = view_state_from_resource(resource);

    let auth = ctx.auth();
    use_effect(move || {
        if view_state_from_resource(resource) == ViewState::Error(ViewError::SignedOut) {
            let auth = auth.clone();
            spawn(async move {
                if let Err(err) = auth.expire_session().await {
                    tracing::warn!(error = %err, "failed to clear rejected token");
                }
                nav.replace(Route::Login {});
            });
        }
    });

    let on_retake = {
        let dashboard = ctx.dashboard();
        use_callback(move |assessment_id: AssessmentId| {
            let dashboard = dashboard.clone();
            let mut notice = notice;
            spawn(async move {
                match dashboard.retake(assessment_id).await {
                    Ok(()) => {
                        nav.push(Route::Assessment {});
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "dashboard retake failed");
                        notice.set(Some("Could not reset your assessment. Please try again."));
                    }
                }
            });
        })
    };
    let open_assessment = move |_: MouseEvent| {
        nav.push(Route::Assessment {});
    };

    let body = match state {
        ViewState::Idle | ViewState::Loading => rsx! {
            p { class: "muted", "Loading your dashboard..." }
        },
        ViewState::Error(err) => rsx! {
            div { class: "notice",
                p { "{err.message()}" }
                button {
                    r#type: "button",
                    onclick: move |_| {
                        let mut resource = resource;
                        resource.restart();
                    },
                    "Retry"
                }
            }
        },
        ViewState::Ready(DashboardVm::NotStarted) => rsx! {
            div { class: "card",
                h3 { "You have not taken the assessment yet." }
                p { "Answer a short set of statements to find the senior high school strand that fits you best." }
                button { class: "primary", r#type: "button", onclick: open_assessment, "Take Assessment" }
            }
        },
        ViewState::Ready(DashboardVm::InProgress {
            assessment_id,
            progress,
        }) => rsx! {
            div { class: "card",
                h3 { "Assessment in progress" }
                p { "Progress: {progress}%" }
                div { class: "actions",
                    button { class: "primary", r#type: "button", onclick: open_assessment, "Continue Assessment" }
                    button {
                        r#type: "button",
                        onclick: move |_| on_retake.call(assessment_id),
                        "Start Over"
                    }
                }
            }
        },
        ViewState::Ready(DashboardVm::Completed(results)) => rsx! {
            ResultsPanel { results, on_retake }
        },
    };

    rsx! {
        div { class: "page",
            h2 { "Dashboard" }
            if let Some(message) = notice() {
                div { class: "alert", role: "alert",
                    p { "{message}" }
                    button { r#type: "button", onclick: move |_| notice.set(None), "Dismiss" }
                }
            }
            {body}
        }
    }
}

#[component]
fn ResultsPanel(results: ResultsVm, on_retake: Callback<AssessmentId>) -> Element {
    let assessment_id = results.assessment_id;
    rsx! {
        div { class: "card results",
            h3 { "Assessment Summary" }
            p { strong { "Recommended Strand: " } "{results.strand}" }
            p { strong { "Description: " } "{results.description}" }
            p { strong { "Dataset Used: " } "{results.dataset}" }
            if let Some(taken_on) = results.taken_on.clone() {
                p { strong { "Date: " } "{taken_on}" }
            }
        }
        div { class: "card",
            h3 { "Scores Per Strand" }
            if results.scores.is_empty() {
                p { class: "muted", "No score data available." }
            } else {
                table {
                    thead { tr { th { "Strand" } th { "Score" } } }
                    tbody {
                        for row in results.scores.clone() {
                            tr { key: "{row.strand}", td { "{row.strand}" } td { "{row.score}" } }
                        }
                    }
                }
            }
        }
        if !results.tie_weights.is_empty() {
            div { class: "card",
                h3 { "Tie Resolution Weights" }
                table {
                    thead { tr { th { "Strand" } th { "Weighted Distance" } } }
                    tbody {
                        for row in results.tie_weights.clone() {
                            tr { key: "{row.strand}", td { "{row.strand}" } td { "{row.score}" } }
                        }
                    }
                }
            }
        }
        div { class: "card",
            h3 { "Closest Matches" }
            if results.neighbors.is_empty() {
                p { class: "muted", "No neighbors found." }
            } else {
                table {
                    thead { tr { th { "#" } th { "Strand" } th { "Distance" } } }
                    tbody {
                        for row in results.neighbors.clone() {
                            tr { key: "{row.rank}", td { "{row.rank}" } td { "{row.strand}" } td { "{row.distance}" } }
                        }
                    }
                }
            }
        }
        div { class: "actions",
            button {
                r#type: "button",
                onclick: move |_| on_retake.call(assessment_id),
                "Retake Assessment"
            }
        }
    }
}
