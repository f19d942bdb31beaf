use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use services::{ApiError, AuthError};

use crate::context::AppContext;
use crate::routes::Route;

fn login_error_message(err: &AuthError) -> String {
    match err {
        AuthError::Api(ApiError::LoginRejected(message)) if !message.trim().is_empty() => {
            message.clone()
        }
        AuthError::Api(ApiError::LoginRejected(_) | ApiError::Unauthorized) => {
            "Invalid email or password.".to_string()
        }
        _ => "Unable to reach the server. Please try again.".to_string(),
    }
}

#[component]
pub fn LoginView() -> Element {
    let ctx = use_context::<AppContext>();
    let nav = use_navigator();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut remember_me = use_signal(|| false);
    let error = use_signal(|| None::<String>);
    let busy = use_signal(|| false);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        if busy() {
            return;
        }
        let auth = ctx.auth();
        let api = ctx.api();
        let mut error = error;
        let mut busy = busy;
        let (email, password, remember_me) = (email(), password(), remember_me());
        spawn(async move {
            busy.set(true);
            let result = auth
                .login(api.as_ref(), &email, &password, remember_me)
                .await;
            busy.set(false);
            match result {
                Ok(_) => {
                    error.set(None);
                    nav.replace(Route::Home {});
                }
                Err(err) => {
                    tracing::warn!(error = %err, "login failed");
                    error.set(Some(login_error_message(&err)));
                }
            }
        });
    };

    rsx! {
        div { class: "login-page",
            form { class: "login-card", onsubmit: on_submit,
                h1 { "Strandify" }
                p { class: "muted", "Sign in to take your strand assessment." }
                if let Some(message) = error() {
                    p { class: "form-error", role: "alert", "{message}" }
                }
                label { r#for: "login-email", "Email" }
                input {
                    id: "login-email",
                    r#type: "email",
                    autocomplete: "username",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
                label { r#for: "login-password", "Password" }
                input {
                    id: "login-password",
                    r#type: "password",
                    autocomplete: "current-password",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
                label { class: "checkbox",
                    input {
                        r#type: "checkbox",
                        checked: remember_me(),
                        onchange: move |evt| remember_me.set(evt.checked()),
                    }
                    "Remember me"
                }
                button {
                    r#type: "submit",
                    disabled: busy() || email().trim().is_empty() || password().is_empty(),
                    if busy() { "Signing in..." } else { "Sign in" }
                }
                div { class: "login-links",
                    Link { to: Route::ForgotPassword {}, "Forgot password?" }
                    Link { to: Route::Signup {}, "Create an account" }
                }
            }
        }
    }
}
