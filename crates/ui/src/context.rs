use std::sync::Arc;
use std::time::Duration;

use services::{
    AccountService, AppServices, AssessmentApi, AuthService, DashboardService, FlowController,
    IdleGuard, IdleTimer,
};

pub trait UiApp: Send + Sync {
    fn api(&self) -> Arc<dyn AssessmentApi>;
    fn auth(&self) -> Arc<AuthService>;
    fn dashboard(&self) -> Arc<DashboardService>;
    fn account(&self) -> Arc<AccountService>;

    /// A fresh controller for one visit to the assessment view.
    fn flow_controller(&self) -> FlowController;
    fn idle_timeout(&self) -> Duration;
}

impl UiApp for AppServices {
    fn api(&self) -> Arc<dyn AssessmentApi> {
        AppServices::api(self)
    }

    fn auth(&self) -> Arc<AuthService> {
        AppServices::auth(self)
    }

    fn dashboard(&self) -> Arc<DashboardService> {
        AppServices::dashboard(self)
    }

    fn account(&self) -> Arc<AccountService> {
        AppServices::account(self)
    }

    fn flow_controller(&self) -> FlowController {
        AppServices::flow_controller(self)
    }

    fn idle_timeout(&self) -> Duration {
        self.config().idle_timeout
    }
}

#[derive(Clone)]
pub struct AppContext {
    app: Arc<dyn UiApp>,
    api: Arc<dyn AssessmentApi>,
    auth: Arc<AuthService>,
    dashboard: Arc<DashboardService>,
    account: Arc<AccountService>,
    idle_timeout: Duration,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            app: Arc::clone(app),
            api: app.api(),
            auth: app.auth(),
            dashboard: app.dashboard(),
            account: app.account(),
            idle_timeout: app.idle_timeout(),
        }
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn AssessmentApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn account(&self) -> Arc<AccountService> {
        Arc::clone(&self.account)
    }

    #[must_use]
    pub fn flow_controller(&self) -> FlowController {
        self.app.flow_controller()
    }

    /// Start the idle countdown; it stops when the guard is dropped.
    #[must_use]
    pub fn arm_idle_timer(&self) -> IdleGuard {
        IdleTimer::arm(self.idle_timeout, self.auth())
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
