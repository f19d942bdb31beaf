use std::time::Duration;

use chrono::NaiveDate;
use dioxus::prelude::*;
use dioxus_router::Link;
use services::{AccountError, ApiError, PendingVerification};
use strand_core::model::{OTP_LENGTH, PasswordReset, SignupForm};

use crate::context::AppContext;
use crate::routes::Route;

pub(crate) const SIGNUP_DONE_MESSAGE: &str = "Your email is verified. You can now sign in.";
pub(crate) const RESET_DONE_MESSAGE: &str = "Your password has been reset.";

fn account_error_message(err: &AccountError) -> String {
    match err {
        AccountError::Form(form) => form.to_string(),
        AccountError::CooldownActive { remaining_secs } => {
            format!("Please wait {remaining_secs}s before requesting another code.")
        }
        AccountError::Api(ApiError::Rejected(message)) => message.clone(),
        AccountError::Api(ApiError::Unauthorized) | AccountError::WrongPurpose => {
            "This code has expired. Please start again.".to_string()
        }
        _ => "Unable to reach the server. Please try again.".to_string(),
    }
}

/// `<input type="date">` hands back `YYYY-MM-DD`, or nothing.
fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Code entry plus the resend button with its countdown.
#[component]
fn OtpPanel(
    pending: Signal<Option<PendingVerification>>,
    code: Signal<String>,
    error: Signal<Option<String>>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let mut notice = use_signal(|| None::<&'static str>);
    let mut tick = use_signal(|| 0_u64);

    use_future(move || async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            *tick.write() += 1;
        }
    });

    // Re-render once a second so the countdown moves.
    let _ = tick();
    let Some(current) = pending() else {
        return rsx! {};
    };
    let cooldown = current.cooldown();

    let on_resend = move |_: MouseEvent| {
        let account = ctx.account();
        let Some(mut current) = pending.peek().clone() else {
            return;
        };
        let (mut pending, mut error) = (pending, error);
        spawn(async move {
            match account.resend(&mut current).await {
                Ok(()) => {
                    pending.set(Some(current));
                    error.set(None);
                    notice.set(Some("A new code is on its way."));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "resend failed");
                    error.set(Some(account_error_message(&err)));
                }
            }
        });
    };

    rsx! {
        div { class: "otp-panel",
            p { "We sent a {OTP_LENGTH}-digit code to {current.email()}." }
            if let Some(message) = notice() {
                p { class: "muted", "{message}" }
            }
            label { r#for: "otp-code", "Verification code" }
            input {
                id: "otp-code",
                inputmode: "numeric",
                autocomplete: "one-time-code",
                maxlength: "{OTP_LENGTH}",
                value: "{code}",
                oninput: move |evt| {
                    let mut code = code;
                    code.set(evt.value());
                },
            }
            button {
                class: "link-button",
                r#type: "button",
                disabled: !cooldown.is_ready(),
                onclick: on_resend,
                "{cooldown.label()}"
            }
        }
    }
}

#[component]
pub fn SignupView() -> Element {
    let ctx = use_context::<AppContext>();

    let mut form = use_signal(SignupForm::default);
    let mut birthday = use_signal(String::new);
    let pending = use_signal(|| None::<PendingVerification>);
    let code = use_signal(String::new);
    let error = use_signal(|| None::<String>);
    let busy = use_signal(|| false);
    let done = use_signal(|| false);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        if busy() {
            return;
        }
        let account = ctx.account();
        let (mut pending, mut error, mut busy, mut done) = (pending, error, busy, done);
        let code = code();
        let mut submitted = form();
        submitted.birthday = parse_birthday(&birthday());
        spawn(async move {
            busy.set(true);
            let step = match pending() {
                None => account.sign_up(&submitted).await.map(|sent| {
                    pending.set(Some(sent));
                }),
                Some(sent) => account.verify_signup(&sent, &code).await.map(|()| {
                    done.set(true);
                }),
            };
            busy.set(false);
            match step {
                Ok(()) => error.set(None),
                Err(err) => {
                    tracing::warn!(error = %err, "signup step failed");
                    error.set(Some(account_error_message(&err)));
                }
            }
        });
    };

    if done() {
        return rsx! {
            div { class: "login-page",
                div { class: "login-card",
                    h1 { "Account created" }
                    p { "{SIGNUP_DONE_MESSAGE}" }
                    Link { to: Route::Login {}, "Go to sign in" }
                }
            }
        };
    }

    let verifying = pending.read().is_some();
    rsx! {
        div { class: "login-page",
            form { class: "login-card", onsubmit: on_submit,
                h1 { "Create your account" }
                if let Some(message) = error() {
                    p { class: "form-error", role: "alert", "{message}" }
                }
                if verifying {
                    OtpPanel { pending, code, error }
                    button {
                        r#type: "submit",
                        disabled: busy() || code().trim().len() < OTP_LENGTH,
                        if busy() { "Verifying..." } else { "Verify Email" }
                    }
                } else {
                    label { r#for: "signup-email", "Email" }
                    input {
                        id: "signup-email",
                        r#type: "email",
                        value: "{form.read().email}",
                        oninput: move |evt| form.write().email = evt.value(),
                    }
                    label { r#for: "signup-first", "First name" }
                    input {
                        id: "signup-first",
                        value: "{form.read().first_name}",
                        oninput: move |evt| form.write().first_name = evt.value(),
                    }
                    label { r#for: "signup-middle", "Middle name (optional)" }
                    input {
                        id: "signup-middle",
                        value: "{form.read().middle_name}",
                        oninput: move |evt| form.write().middle_name = evt.value(),
                    }
                    label { r#for: "signup-last", "Last name" }
                    input {
                        id: "signup-last",
                        value: "{form.read().last_name}",
                        oninput: move |evt| form.write().last_name = evt.value(),
                    }
                    label { r#for: "signup-affix", "Suffix (optional)" }
                    input {
                        id: "signup-affix",
                        value: "{form.read().affix}",
                        oninput: move |evt| form.write().affix = evt.value(),
                    }
                    label { r#for: "signup-birthday", "Birthday" }
                    input {
                        id: "signup-birthday",
                        r#type: "date",
                        value: "{birthday}",
                        oninput: move |evt| birthday.set(evt.value()),
                    }
                    label { r#for: "signup-password", "Password" }
                    input {
                        id: "signup-password",
                        r#type: "password",
                        autocomplete: "new-password",
                        value: "{form.read().password}",
                        oninput: move |evt| form.write().password = evt.value(),
                    }
                    label { r#for: "signup-confirm", "Confirm password" }
                    input {
                        id: "signup-confirm",
                        r#type: "password",
                        autocomplete: "new-password",
                        value: "{form.read().confirm_password}",
                        oninput: move |evt| form.write().confirm_password = evt.value(),
                    }
                    button {
                        r#type: "submit",
                        disabled: busy(),
                        if busy() { "Sending code..." } else { "Sign up" }
                    }
                }
                p { class: "muted",
                    "Already have an account? "
                    Link { to: Route::Login {}, "Sign in" }
                }
            }
        }
    }
}

#[component]
pub fn ForgotPasswordView() -> Element {
    let ctx = use_context::<AppContext>();

    let mut email = use_signal(String::new);
    let mut new_password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let pending = use_signal(|| None::<PendingVerification>);
    let code = use_signal(String::new);
    let error = use_signal(|| None::<String>);
    let busy = use_signal(|| false);
    let done = use_signal(|| false);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        if busy() {
            return;
        }
        let account = ctx.account();
        let (mut pending, mut error, mut busy, mut done) = (pending, error, busy, done);
        let (email, code) = (email(), code());
        let reset = PasswordReset {
            new_password: new_password(),
            confirm_password: confirm_password(),
        };
        spawn(async move {
            busy.set(true);
            let step = match pending() {
                None => account.request_reset(&email).await.map(|sent| {
                    pending.set(Some(sent));
                }),
                Some(sent) => account.reset_password(&sent, &code, &reset).await.map(|()| {
                    done.set(true);
                }),
            };
            busy.set(false);
            match step {
                Ok(()) => error.set(None),
                Err(err) => {
                    tracing::warn!(error = %err, "password reset step failed");
                    error.set(Some(account_error_message(&err)));
                }
            }
        });
    };

    if done() {
        return rsx! {
            div { class: "login-page",
                div { class: "login-card",
                    h1 { "Password updated" }
                    p { "{RESET_DONE_MESSAGE}" }
                    Link { to: Route::Login {}, "Back to sign in" }
                }
            }
        };
    }

    let verifying = pending.read().is_some();
    rsx! {
        div { class: "login-page",
            form { class: "login-card", onsubmit: on_submit,
                h1 { "Reset your password" }
                if let Some(message) = error() {
                    p { class: "form-error", role: "alert", "{message}" }
                }
                if verifying {
                    OtpPanel { pending, code, error }
                    label { r#for: "reset-password", "New password" }
                    input {
                        id: "reset-password",
                        r#type: "password",
                        autocomplete: "new-password",
                        value: "{new_password}",
                        oninput: move |evt| new_password.set(evt.value()),
                    }
                    label { r#for: "reset-confirm", "Confirm password" }
                    input {
                        id: "reset-confirm",
                        r#type: "password",
                        autocomplete: "new-password",
                        value: "{confirm_password}",
                        oninput: move |evt| confirm_password.set(evt.value()),
                    }
                    button {
                        r#type: "submit",
                        disabled: busy(),
                        if busy() { "Saving..." } else { "Reset Password" }
                    }
                } else {
                    p { class: "muted", "Enter your email and we will send you a code." }
                    label { r#for: "reset-email", "Email" }
                    input {
                        id: "reset-email",
                        r#type: "email",
                        value: "{email}",
                        oninput: move |evt| email.set(evt.value()),
                    }
                    button {
                        r#type: "submit",
                        disabled: busy() || email().trim().is_empty(),
                        if busy() { "Sending code..." } else { "Send Code" }
                    }
                }
                Link { to: Route::Login {}, "Back to sign in" }
            }
        }
    }
}
