use storage::repository::{Storage, TokenRecord};
use strand_core::Clock;
use strand_core::model::{AuthToken, TokenScope};

use crate::api::{AssessmentApi, LoginRequest};
use crate::error::AuthError;

/// Login token lifecycle across the two storage scopes.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    storage: Storage,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self { clock, storage }
    }

    /// Log in and keep the token in the scope `remember_me` selects.
    ///
    /// The other scope is cleared so a stale token cannot shadow the new one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` when the backend rejects the login and
    /// `AuthError::Storage` if the token cannot be stored.
    pub async fn login(
        &self,
        api: &dyn AssessmentApi,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthToken, AuthError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            remember: remember_me,
        };
        let token = api.login(&request).await?;

        let scope = TokenScope::for_remember_me(remember_me);
        let other = match scope {
            TokenScope::Persistent => TokenScope::Session,
            TokenScope::Session => TokenScope::Persistent,
        };
        self.storage.scope(other).clear_token().await?;
        self.storage
            .scope(scope)
            .save_token(&TokenRecord::new(token.clone(), scope, self.clock.now()))
            .await?;

        tracing::info!(scope = scope.as_str(), "login succeeded");
        Ok(token)
    }

    /// Token from session scope first, then the remembered one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if either scope cannot be read.
    pub async fn current_token(&self) -> Result<Option<AuthToken>, AuthError> {
        for scope in [TokenScope::Session, TokenScope::Persistent] {
            if let Some(record) = self.storage.scope(scope).load_token().await? {
                return Ok(Some(record.token));
            }
        }
        Ok(None)
    }

    /// Like [`AuthService::current_token`] but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` when neither scope holds a token.
    pub async fn require_token(&self) -> Result<AuthToken, AuthError> {
        self.current_token().await?.ok_or(AuthError::NotLoggedIn)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if a scope cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.clear_all().await?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Drop the token after idle timeout or a 401.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if a scope cannot be cleared.
    pub async fn expire_session(&self) -> Result<(), AuthError> {
        self.clear_all().await?;
        tracing::info!("session expired; token cleared");
        Ok(())
    }

    /// `true` only when a token is stored and the backend still accepts it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for storage failures or transport errors.
    pub async fn check_session(&self, api: &dyn AssessmentApi) -> Result<bool, AuthError> {
        let Some(token) = self.current_token().await? else {
            return Ok(false);
        };
        Ok(api.check_session(&token).await?)
    }

    async fn clear_all(&self) -> Result<(), AuthError> {
        self.storage.persistent.clear_token().await?;
        self.storage.session.clear_token().await?;
        Ok(())
    }
}
