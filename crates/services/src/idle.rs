//! Session idle timeout.
//!
//! A single background task sleeps for the configured timeout and restarts
//! the sleep on every activity event. When a full timeout passes with no
//! activity it clears the stored token and reports expiry. The task lives as
//! long as the returned [`IdleGuard`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::auth_service::AuthService;

/// User input that counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityEvent {
    MouseMove,
    KeyDown,
    Click,
    Scroll,
    TouchStart,
    TouchMove,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 6] = [
        Self::MouseMove,
        Self::KeyDown,
        Self::Click,
        Self::Scroll,
        Self::TouchStart,
        Self::TouchMove,
    ];

    /// DOM event name, as used by webview listeners.
    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::MouseMove => "mousemove",
            Self::KeyDown => "keydown",
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
        }
    }

    #[must_use]
    pub fn from_dom_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.dom_name() == name)
    }
}

pub struct IdleTimer;

impl IdleTimer {
    /// Start the timer. Must be called inside a tokio runtime.
    #[must_use]
    pub fn arm(timeout: Duration, auth: Arc<AuthService>) -> IdleGuard {
        let (activity_tx, mut activity_rx) = mpsc::unbounded_channel::<ActivityEvent>();
        let (expired_tx, expired_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(timeout) => break,
                    event = activity_rx.recv() => match event {
                        Some(_) => continue,
                        None => return,
                    },
                }
            }

            if let Err(err) = auth.expire_session().await {
                tracing::warn!(error = %err, "failed to clear token on idle timeout");
            }
            tracing::info!(timeout_secs = timeout.as_secs(), "idle timeout reached");
            let _ = expired_tx.send(true);
        });

        IdleGuard {
            activity: activity_tx,
            expired: expired_rx,
            task,
        }
    }
}

/// Owns the running idle timer; dropping it cancels the timer.
pub struct IdleGuard {
    activity: mpsc::UnboundedSender<ActivityEvent>,
    expired: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl IdleGuard {
    /// Restart the countdown.
    pub fn touch(&self, event: ActivityEvent) {
        let _ = self.activity.send(event);
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        *self.expired.borrow()
    }

    /// Resolves once the timeout fired and the token was cleared.
    pub async fn expired(&mut self) {
        // An Err means the timer task is gone without expiring.
        if self.expired.wait_for(|expired| *expired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
