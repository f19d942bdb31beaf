use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::use_navigator;
use services::ActivityEvent;

use super::scripts::{ACTIVITY_UNLISTEN_SCRIPT, activity_listener_script};
use crate::context::AppContext;
use crate::routes::Route;

/// Arm the idle timer for as long as the calling component is mounted.
///
/// Activity in the webview restarts the countdown. On expiry the token is
/// already gone, so the only thing left is to send the user to login. The
/// webview listeners are removed again on unmount.
pub fn use_idle_timeout() {
    let ctx = use_context::<AppContext>();
    let nav = use_navigator();

    use_future(move || {
        let ctx = ctx.clone();
        async move {
            let mut guard = ctx.arm_idle_timer();
            let names: Vec<&str> = ActivityEvent::ALL
                .iter()
                .map(|event| event.dom_name())
                .collect();
            let mut activity = eval(&activity_listener_script(&names));
            let mut listening = true;

            loop {
                if !listening {
                    guard.expired().await;
                    break;
                }
                tokio::select! {
                    () = guard.expired() => break,
                    name = activity.recv::<String>() => match name {
                        Ok(name) => {
                            if let Some(event) = ActivityEvent::from_dom_name(&name) {
                                guard.touch(event);
                            }
                        }
                        Err(_) => listening = false,
                    },
                }
            }

            tracing::info!("idle timeout; returning to login");
            nav.replace(Route::Login {});
        }
    });

    use_drop(|| {
        let _ = eval(ACTIVITY_UNLISTEN_SCRIPT);
    });
}
