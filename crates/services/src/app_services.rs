use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account::AccountService;
use crate::api::{AssessmentApi, HttpAssessmentApi, InMemoryAssessmentApi};
use crate::auth_service::AuthService;
use crate::config::ApiConfig;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::flow_controller::FlowController;
use crate::idle::{IdleGuard, IdleTimer};

/// Assembles app-facing services around one backend and one token store.
#[derive(Clone)]
pub struct AppServices {
    config: ApiConfig,
    api: Arc<dyn AssessmentApi>,
    auth: Arc<AuthService>,
    dashboard: Arc<DashboardService>,
    account: Arc<AccountService>,
}

impl AppServices {
    /// Build services talking to the REST backend, with remembered tokens in
    /// `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client
    /// construction fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: ApiConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn AssessmentApi> = Arc::new(HttpAssessmentApi::new(config.clone())?);
        Ok(Self::assemble(clock, config, storage, api))
    }

    /// Offline mode: the in-process backend and in-memory token storage.
    #[must_use]
    pub fn offline(clock: Clock, config: ApiConfig) -> Self {
        Self::with_api(clock, config, Arc::new(InMemoryAssessmentApi::demo()))
    }

    /// In-memory storage around any backend.
    #[must_use]
    pub fn with_api(clock: Clock, config: ApiConfig, api: Arc<dyn AssessmentApi>) -> Self {
        Self::assemble(clock, config, Storage::in_memory(), api)
    }

    fn assemble(
        clock: Clock,
        config: ApiConfig,
        storage: Storage,
        api: Arc<dyn AssessmentApi>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(clock, storage));
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&api), Arc::clone(&auth)));
        let account = Arc::new(AccountService::new(Arc::clone(&api)));
        Self {
            config,
            api,
            auth,
            dashboard,
            account,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
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

    /// A fresh, uninitialized controller for one visit to the assessment view.
    #[must_use]
    pub fn flow_controller(&self) -> FlowController {
        FlowController::new(self.api(), self.auth(), self.config.page_size)
    }

    /// Arm the session idle timer with the configured timeout.
    #[must_use]
    pub fn arm_idle_timer(&self) -> IdleGuard {
        IdleTimer::arm(self.config.idle_timeout, self.auth())
    }
}
