use dioxus::desktop::tao::event::{Event, WindowEvent};
use dioxus::desktop::{use_wry_event_handler, window};
use dioxus::prelude::*;
use strand_core::LeaveSignal;

use super::LeaveGuard;

/// Hold the window open while the guard wants a confirmation.
///
/// The desktop config hides the window on close instead of destroying it, so
/// this handler is the one that actually closes it.
pub fn use_window_close_guard(guard: LeaveGuard) {
    use_wry_event_handler(move |event, _| {
        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            spawn(close_when_allowed(guard));
        }
    });
}

async fn close_when_allowed(guard: LeaveGuard) {
    let desktop = window();
    if guard
        .decision(LeaveSignal::WindowClose)
        .needs_confirmation()
    {
        desktop.set_visible(true);
        desktop.set_focus();
    }
    if guard.confirm_close().await {
        tracing::info!("closing window");
        desktop.close();
    } else {
        tracing::debug!("window close cancelled");
    }
}
