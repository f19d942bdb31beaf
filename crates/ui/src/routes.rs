use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable, use_navigator};

use crate::context::AppContext;
use crate::views::{
    AssessmentView, ForgotPasswordView, HomeView, LeaveGuard, LoginView, SessionExpiredNotice,
    SignupView, ViewError, ViewState, use_idle_timeout, view_state_from_resource,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/login", LoginView)] Login {},
    #[route("/signup", SignupView)] Signup {},
    #[route("/forgot-password", ForgotPasswordView)] ForgotPassword {},
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/assessment", AssessmentView)] Assessment {},
}

/// Shell for every signed-in page. Checks the stored token on each load.
#[component]
pub(crate) fn Layout() -> Element {
    let ctx = use_context::<AppContext>();
    use_idle_timeout();

    let session = use_resource(move || {
        let auth = ctx.auth();
        let api = ctx.api();
        async move {
            match auth.check_session(api.as_ref()).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ViewError::SignedOut),
                Err(err) => Err(ViewError::from(&err)),
            }
        }
    });

    let body = match view_state_from_resource(session) {
        ViewState::Ready(()) => rsx! { Outlet::<Route> {} },
        ViewState::Idle | ViewState::Loading => rsx! {
            p { class: "muted", "Checking your session..." }
        },
        ViewState::Error(ViewError::SignedOut) => rsx! { SessionExpiredNotice {} },
        ViewState::Error(err) => rsx! {
            div { class: "notice",
                p { "{err.message()}" }
                button {
                    r#type: "button",
                    onclick: move |_| {
                        let mut session = session;
                        session.restart();
                    },
                    "Retry"
                }
            }
        },
    };

    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content", {body} }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let guard = use_context::<LeaveGuard>();
    let nav = use_navigator();

    let go = move |target: Route| {
        spawn(async move {
            if guard.confirm_leave().await {
                nav.push(target);
            }
        });
    };

    let logout = move |_: MouseEvent| {
        let auth = ctx.auth();
        let mut guard = guard;
        spawn(async move {
            if !guard.confirm_leave().await {
                return;
            }
            if let Err(err) = auth.logout().await {
                tracing::warn!(error = %err, "logout failed to clear the token");
            }
            guard.clear();
            nav.replace(Route::Login {});
        });
    };

    rsx! {
        nav { class: "sidebar",
            h1 { "Strandify" }
            ul {
                li {
                    button {
                        class: "sidebar__link",
                        r#type: "button",
                        onclick: move |_| go(Route::Home {}),
                        "Dashboard"
                    }
                }
                li {
                    button {
                        class: "sidebar__link",
                        r#type: "button",
                        onclick: move |_| go(Route::Assessment {}),
                        "Assessment"
                    }
                }
                li {
                    button {
                        class: "sidebar__link sidebar__link--logout",
                        r#type: "button",
                        onclick: logout,
                        "Log out"
                    }
                }
            }
        }
    }
}
