use dioxus::prelude::*;
use services::{ApiError, AuthError, DashboardError};

use crate::vm::SESSION_EXPIRED_MESSAGE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The token is missing or the backend rejected it.
    SignedOut,
    /// Backend is up but has nothing to show yet.
    Unavailable,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::SignedOut => SESSION_EXPIRED_MESSAGE,
            Self::Unavailable => "No assessment is open right now. Please check back later.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<&DashboardError> for ViewError {
    fn from(err: &DashboardError) -> Self {
        match err {
            DashboardError::NoActiveDataset => Self::Unavailable,
            DashboardError::Auth(_) | DashboardError::Api(ApiError::Unauthorized) => {
                Self::SignedOut
            }
            _ => Self::Unknown,
        }
    }
}

impl From<&AuthError> for ViewError {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::NotLoggedIn | AuthError::Api(ApiError::Unauthorized) => Self::SignedOut,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
