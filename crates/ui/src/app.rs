use dioxus::prelude::*;
use dioxus_router::Router;

use crate::routes::Route;
use crate::views::{LeaveGuard, use_window_close_guard};

/// Root of the Strandify window: routes, the shared leave guard, and the
/// close-window confirmation that reads it.
#[component]
pub fn App() -> Element {
    let guard = use_context_provider(LeaveGuard::new);
    use_window_close_guard(guard);

    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }
        document::Title { "Strandify" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| {
                    tracing::error!(?errors, "render failed");
                    rsx! {
                        div { class: "fatal",
                            h1 { "Strandify hit an unexpected error" }
                            p { "Your saved answers are safe. Restart the app to continue." }
                            details {
                                summary { "Details" }
                                pre { "{errors:?}" }
                            }
                        }
                    }
                },
                Router::<Route> {}
            }
        }
    }
}
