#![forbid(unsafe_code)]

pub mod account;
pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod flow_controller;
pub mod idle;

pub use strand_core::Clock;

pub use account::{
    AccountService, OTP_RESEND_COOLDOWN, PendingVerification, ResendCooldown, VerificationPurpose,
};
pub use api::{ApiCall, AssessmentApi, HttpAssessmentApi, InMemoryAssessmentApi};
pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use config::{ApiConfig, AuthPolicy};
pub use dashboard::{DashboardOverview, DashboardService};
pub use error::{
    AccountError, ApiError, AppServicesError, AuthError, ConfigError, ControllerError,
    DashboardError,
};
pub use flow_controller::{
    AnswerAck, AnswerWrite, ControllerStatus, FlowController, HaltReason, RetakeOrigin,
    SubmitOutcome,
};
pub use idle::{ActivityEvent, IdleGuard, IdleTimer};
