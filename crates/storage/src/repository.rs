use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use strand_core::model::{AuthToken, TokenScope};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a login token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: AuthToken,
    pub scope: TokenScope,
    pub saved_at: DateTime<Utc>,
}

impl TokenRecord {
    #[must_use]
    pub fn new(token: AuthToken, scope: TokenScope, saved_at: DateTime<Utc>) -> Self {
        Self {
            token,
            scope,
            saved_at,
        }
    }
}

/// Storage for the token of a single scope.
///
/// Writes happen once per login; reads happen on every authenticated screen.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Fetch the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the token cannot be stored.
    async fn save_token(&self, record: &TokenRecord) -> Result<(), StorageError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    async fn clear_token(&self) -> Result<(), StorageError>;
}

/// Process-memory token slot. Backs the session scope and tests.
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    slot: Arc<Mutex<Option<TokenRecord>>>,
}

impl InMemoryTokenRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_token(&self, record: &TokenRecord) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(record.clone());
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// The two token scopes behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub persistent: Arc<dyn TokenRepository>,
    pub session: Arc<dyn TokenRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            persistent: Arc::new(InMemoryTokenRepository::new()),
            session: Arc::new(InMemoryTokenRepository::new()),
        }
    }

    #[must_use]
    pub fn scope(&self, scope: TokenScope) -> Arc<dyn TokenRepository> {
        match scope {
            TokenScope::Persistent => Arc::clone(&self.persistent),
            TokenScope::Session => Arc::clone(&self.session),
        }
    }
}
