use dioxus::prelude::*;
use dioxus_router::{Navigator, use_navigator};
use services::{AnswerAck, ControllerError, FlowController, RetakeOrigin, SubmitOutcome};
use strand_core::model::{AnswerValue, QuestionId};
use strand_core::{NavTarget, PageAdvance};

use super::expiry::SessionExpiredNotice;
use super::guard::LeavePolicy;
use super::scripts;
use crate::context::AppContext;
use crate::routes::Route;
use crate::views::LeaveGuard;
use crate::vm::{
    AssessmentScreen, COMPLETED_TITLE, PreSurveyVm, QuestionPageVm, QuestionVm,
    SUBMITTING_MESSAGE, VALIDATION_MESSAGE, parse_course_choice, question_dom_id,
    scale_options,
};

const START_FAILED: &str = "Failed to start the assessment. Please try again.";
const SUBMIT_FAILED: &str = "Failed to submit the assessment. Please try again.";
const RETAKE_FAILED: &str = "Could not reset your assessment. Please try again.";

/// The controller is taken out of its slot while start, submit or retake
/// await the backend. Acks that land in that window wait in `parked`.
#[derive(Clone, Copy)]
struct AssessmentHandles {
    controller: Signal<Option<FlowController>>,
    parked: Signal<Vec<AnswerAck>>,
    screen: Signal<AssessmentScreen>,
    alert: Signal<Option<&'static str>>,
    guard: LeaveGuard,
}

impl AssessmentHandles {
    /// Re-derive the screen and the leave guard after a controller change.
    fn sync(mut self) {
        let (screen, policy) = match self.controller.peek().as_ref() {
            Some(controller) => (
                AssessmentScreen::from_status(controller.status(), controller.courses()),
                LeavePolicy::judge(|signal| controller.leave_decision(signal)),
            ),
            None => return,
        };
        self.screen.set(screen);
        self.guard.set(policy);
    }

    fn deliver(mut self, ack: AnswerAck) {
        let applied = match self.controller.write().as_mut() {
            Some(controller) => controller.apply_ack(&ack),
            None => {
                self.parked.write().push(ack);
                false
            }
        };
        if applied {
            self.sync();
        }
    }

    fn put_back(mut self, mut controller: FlowController) {
        let parked = std::mem::take(&mut *self.parked.write());
        if !parked.is_empty() {
            let applied = controller.apply_acks(parked);
            tracing::debug!(applied, "applied answer acks held during a backend call");
        }
        self.controller.set(Some(controller));
    }

    fn with_controller<T>(
        mut self,
        f: impl FnOnce(&mut FlowController) -> Result<T, ControllerError>,
    ) -> Option<T> {
        let result = {
            let mut slot = self.controller.write();
            let controller = slot.as_mut()?;
            f(controller)
        };
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, "assessment action rejected");
                None
            }
        }
    }

    /// Auth failures mid-flow; the expiry notice clears the token.
    fn sign_out(mut self) {
        self.guard.clear();
        self.screen.set(AssessmentScreen::SignInRequired);
    }
}

#[component]
pub fn AssessmentView() -> Element {
    let ctx = use_context::<AppContext>();
    let nav = use_navigator();
    let guard = use_context::<LeaveGuard>();

    let controller = use_signal(|| None::<FlowController>);
    let parked = use_signal(Vec::<AnswerAck>::new);
    let screen = use_signal(|| AssessmentScreen::Loading);
    let alert = use_signal(|| None::<&'static str>);
    let submitting = use_signal(|| false);
    let handles = AssessmentHandles {
        controller,
        parked,
        screen,
        alert,
        guard,
    };

    let _loader = use_resource(move || {
        let ctx = ctx.clone();
        async move {
            let mut fresh = ctx.flow_controller();
            fresh.initialize().await;
            handles.put_back(fresh);
            handles.sync();
        }
    });

    use_drop(move || {
        let mut guard = guard;
        guard.clear();
    });

    let on_first_year = use_callback(move |is_first_year: bool| {
        handles.with_controller(|c| c.answer_first_year(is_first_year));
        handles.sync();
    });

    let on_course = use_callback(move |raw: String| {
        let course = parse_course_choice(&raw);
        handles.with_controller(|c| c.select_course(course));
        handles.sync();
    });

    let on_start = use_callback(move |()| {
        let mut handles = handles;
        spawn(async move {
            let Some(mut taken) = handles.controller.write().take() else {
                return;
            };
            let result = taken.start().await;
            handles.put_back(taken);
            match result {
                Ok(()) => {
                    handles.alert.set(None);
                    handles.sync();
                    scripts::scroll_to_top().await;
                }
                Err(err) if err.is_auth() => handles.sign_out(),
                Err(_) => {
                    handles.alert.set(Some(START_FAILED));
                    handles.sync();
                }
            }
        });
    });

    let on_answer = use_callback(move |(question, value): (QuestionId, u8)| {
        let Ok(value) = AnswerValue::new(i64::from(value)) else {
            return;
        };
        let Some(write) = handles.with_controller(|c| c.record_answer(question, value)) else {
            return;
        };
        handles.sync();
        spawn(async move {
            let ack = write.persist().await;
            handles.deliver(ack);
        });
    });

    let on_next = use_callback(move |()| {
        let advance = handles.with_controller(FlowController::next_page);
        handles.sync();
        match advance {
            Some(PageAdvance::Advanced(_)) => {
                spawn(scripts::scroll_to_top());
            }
            Some(PageAdvance::Blocked(question)) => {
                spawn(async move {
                    scripts::scroll_into_view(&question_dom_id(question)).await;
                });
            }
            Some(PageAdvance::LastPage) | None => {}
        }
    });

    let on_previous = use_callback(move |()| {
        if handles
            .with_controller(FlowController::previous_page)
            .flatten()
            .is_some()
        {
            handles.sync();
            spawn(scripts::scroll_to_top());
        }
    });

    let on_submit = use_callback(move |()| {
        if submitting() {
            return;
        }
        let mut handles = handles;
        let mut submitting = submitting;
        spawn(async move {
            let Some(mut taken) = handles.controller.write().take() else {
                return;
            };
            submitting.set(true);
            let result = taken.submit().await;
            handles.put_back(taken);
            submitting.set(false);
            match result {
                Ok(SubmitOutcome::Completed) => {
                    handles.alert.set(None);
                    handles.sync();
                }
                Ok(SubmitOutcome::Blocked(question)) => {
                    handles.sync();
                    scripts::scroll_into_view(&question_dom_id(question)).await;
                }
                Err(err) if err.is_auth() => handles.sign_out(),
                Err(_) => {
                    handles.alert.set(Some(SUBMIT_FAILED));
                    handles.sync();
                }
            }
        });
    });

    let on_confirm = use_callback(move |()| {
        let target = handles.with_controller(|c| c.confirm_completion());
        leave_to(nav, guard, target.unwrap_or(NavTarget::DashboardHome));
    });

    let on_retake = use_callback(move |()| {
        let mut handles = handles;
        spawn(async move {
            let Some(mut taken) = handles.controller.write().take() else {
                return;
            };
            let result = taken.retake(RetakeOrigin::InFlow).await;
            handles.put_back(taken);
            match result {
                Ok(()) => {
                    handles.alert.set(None);
                    handles.sync();
                }
                Err(err) if err.is_auth() => handles.sign_out(),
                Err(_) => handles.alert.set(Some(RETAKE_FAILED)),
            }
        });
    });

    let current = screen.read().clone();
    let body = match current {
        AssessmentScreen::Loading => rsx! {
            p { class: "muted", "Loading assessment..." }
        },
        AssessmentScreen::SignInRequired => rsx! {
            SessionExpiredNotice {}
        },
        AssessmentScreen::Unavailable(message) => rsx! {
            div { class: "notice", p { "{message}" } }
        },
        AssessmentScreen::PreSurvey(vm) => rsx! {
            PreSurveyPanel { vm, on_first_year, on_course, on_start }
        },
        AssessmentScreen::Questions(vm) => rsx! {
            QuestionPage {
                vm,
                disabled: submitting(),
                on_answer,
                on_next,
                on_previous,
                on_submit,
            }
        },
        AssessmentScreen::Completed => rsx! {
            CompletionModal { on_confirm, on_retake }
        },
    };

    let mut alert = alert;
    rsx! {
        div { class: "page assessment", id: "assessment-root",
            h2 { "Strand Assessment" }
            if let Some(message) = alert() {
                div { class: "alert", role: "alert",
                    p { "{message}" }
                    button { r#type: "button", onclick: move |_| alert.set(None), "Dismiss" }
                }
            }
            {body}
            if submitting() {
                div { class: "overlay",
                    div { class: "spinner" }
                    p { {SUBMITTING_MESSAGE} }
                }
            }
        }
    }
}

fn leave_to(nav: Navigator, mut guard: LeaveGuard, target: NavTarget) {
    guard.clear();
    match target {
        NavTarget::DashboardHome => nav.replace(Route::Home {}),
        NavTarget::Login => nav.replace(Route::Login {}),
    };
}

#[component]
fn PreSurveyPanel(
    vm: PreSurveyVm,
    on_first_year: Callback<bool>,
    on_course: Callback<String>,
    on_start: Callback<()>,
) -> Element {
    let selected_course = vm
        .courses
        .iter()
        .find(|course| course.selected)
        .map(|course| course.id.to_string())
        .unwrap_or_default();

    rsx! {
        div { class: "card pre-survey",
            h3 { "Before we begin" }
            p { "Are you a first-year college student?" }
            div { class: "choice-row",
                label { class: "choice",
                    input {
                        r#type: "radio",
                        name: "first-year",
                        checked: vm.is_first_year == Some(true),
                        onchange: move |_| on_first_year.call(true),
                    }
                    "Yes"
                }
                label { class: "choice",
                    input {
                        r#type: "radio",
                        name: "first-year",
                        checked: vm.is_first_year == Some(false),
                        onchange: move |_| on_first_year.call(false),
                    }
                    "No"
                }
            }
            if vm.show_courses {
                label { r#for: "course-select", "Which course are you taking?" }
                select {
                    id: "course-select",
                    value: "{selected_course}",
                    onchange: move |evt| on_course.call(evt.value()),
                    option { value: "", "Select your course" }
                    for course in vm.courses.clone() {
                        option {
                            key: "{course.id}",
                            value: "{course.id}",
                            selected: course.selected,
                            "{course.name}"
                        }
                    }
                }
            }
            button {
                class: "primary",
                r#type: "button",
                disabled: !vm.can_start,
                onclick: move |_| on_start.call(()),
                if vm.resuming { "Continue" } else { "Start Assessment" }
            }
        }
    }
}

#[component]
fn QuestionPage(
    vm: QuestionPageVm,
    disabled: bool,
    on_answer: Callback<(QuestionId, u8)>,
    on_next: Callback<()>,
    on_previous: Callback<()>,
    on_submit: Callback<()>,
) -> Element {
    let status = vm.status_line();
    rsx! {
        div { class: "question-page",
            p { class: "page-status", "{status}" }
            div { class: "progress-bar",
                div { class: "progress-bar__fill", width: "{vm.progress}%" }
            }
            for question in vm.questions.clone() {
                QuestionRow { key: "{question.id}", question: question.clone(), disabled, on_answer }
            }
            div { class: "page-nav",
                if vm.show_previous {
                    button {
                        r#type: "button",
                        disabled,
                        onclick: move |_| on_previous.call(()),
                        "Previous"
                    }
                }
                if vm.show_submit {
                    button {
                        class: "primary",
                        r#type: "button",
                        disabled,
                        onclick: move |_| on_submit.call(()),
                        "Submit"
                    }
                } else {
                    button {
                        class: "primary",
                        r#type: "button",
                        disabled,
                        onclick: move |_| on_next.call(()),
                        "Next"
                    }
                }
            }
        }
    }
}

#[component]
fn QuestionRow(
    question: QuestionVm,
    disabled: bool,
    on_answer: Callback<(QuestionId, u8)>,
) -> Element {
    let question_id = question.id;
    let dom_id = question.dom_id();
    let class = if question.flagged {
        "question question--flagged"
    } else {
        "question"
    };

    rsx! {
        div { class, id: "{dom_id}",
            p { class: "question__text", "{question.number}. {question.text}" }
            div { class: "scale",
                for option in scale_options() {
                    label { key: "{option.value}", class: "scale__option",
                        input {
                            r#type: "radio",
                            name: "{dom_id}",
                            value: "{option.value}",
                            checked: question.selected == Some(option.value),
                            disabled,
                            onchange: move |_| on_answer.call((question_id, option.value)),
                        }
                        span { {option.label} }
                    }
                }
            }
            if question.flagged {
                p { class: "question__warning", {VALIDATION_MESSAGE} }
            }
        }
    }
}

#[component]
fn CompletionModal(on_confirm: Callback<()>, on_retake: Callback<()>) -> Element {
    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal", role: "dialog",
                h3 { {COMPLETED_TITLE} }
                p { "Your answers have been submitted. Your recommended strand is waiting on the dashboard." }
                div { class: "actions",
                    button {
                        class: "primary",
                        r#type: "button",
                        onclick: move |_| on_confirm.call(()),
                        "Confirm"
                    }
                    button {
                        r#type: "button",
                        onclick: move |_| on_retake.call(()),
                        "Retake Assessment"
                    }
                }
            }
        }
    }
}
