//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use strand_core::flow::FlowError;
use strand_core::model::{AccountFormError, AnswerError};

/// Errors emitted by `AssessmentApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not authorized; sign in again")]
    Unauthorized,
    #[error("results are locked until the assessment is completed")]
    Locked,
    #[error("not found")]
    NotFound,
    #[error("login rejected: {0}")]
    LoginRejected(String),
    /// A 4xx from the signup or reset endpoints, with the backend's message.
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("backend returned an unexpected payload: {0}")]
    Payload(String),
    #[error("simulated failure: {0}")]
    Simulated(&'static str),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Failures that mean the stored token is no good anymore.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("no login token in either storage scope")]
    NotLoggedIn,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `FlowController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("assessment data is not loaded")]
    NotReady,
    #[error("failed to start assessment: {0}")]
    Start(#[source] ApiError),
    #[error("failed to submit assessment: {0}")]
    Submit(#[source] ApiError),
    #[error("failed to delete assessment: {0}")]
    Retake(#[source] ApiError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ControllerError {
    /// Whether the failure means the user has to log in again.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Start(err) | Self::Submit(err) | Self::Retake(err) => err.is_auth(),
            Self::Auth(_) => true,
            _ => false,
        }
    }
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("no active dataset")]
    NoActiveDataset,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountError {
    #[error(transparent)]
    Form(#[from] AccountFormError),
    #[error("wait {remaining_secs}s before requesting another code")]
    CooldownActive { remaining_secs: u64 },
    #[error("this code belongs to a different step")]
    WrongPurpose,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API url `{value}`: {source}")]
    ApiUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported API url scheme `{0}`")]
    ApiScheme(String),
    #[error("unknown auth mode `{0}` (expected `bearer` or `cookie`)")]
    AuthMode(String),
    #[error("invalid {name} `{value}`")]
    Number { name: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
