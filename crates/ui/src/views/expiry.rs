use std::time::Duration;

use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::SESSION_EXPIRED_MESSAGE;

pub(crate) const LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(3);

/// Shown wherever the backend stops accepting the token. Clears the stored
/// token on mount and moves on to login after [`LOGIN_REDIRECT_DELAY`].
#[component]
pub(crate) fn SessionExpiredNotice() -> Element {
    let ctx = use_context::<AppContext>();
    let nav = use_navigator();
    let mut dismissed = use_signal(|| false);

    use_future(move || {
        let auth = ctx.auth();
        async move {
            if let Err(err) = auth.expire_session().await {
                tracing::warn!(error = %err, "failed to clear rejected token");
            }
            tokio::time::sleep(LOGIN_REDIRECT_DELAY).await;
            nav.replace(Route::Login {});
        }
    });

    if dismissed() {
        return rsx! {};
    }
    rsx! {
        div { class: "notice", role: "alert",
            p { {SESSION_EXPIRED_MESSAGE} }
            button {
                r#type: "button",
                onclick: move |_| dismissed.set(true),
                "Dismiss"
            }
        }
    }
}
