use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use strand_core::model::{AuthToken, TokenScope};

use crate::repository::{StorageError, TokenRecord, TokenRepository};

use super::SqliteRepository;

const SCOPE: TokenScope = TokenScope::Persistent;

#[async_trait]
impl TokenRepository for SqliteRepository {
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT token, saved_at
            FROM auth_tokens
            WHERE scope = ?1
            ",
        )
        .bind(SCOPE.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row
            .try_get("token")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let saved_at: DateTime<Utc> = row
            .try_get("saved_at")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let token = AuthToken::new(raw)
            .ok_or_else(|| StorageError::Serialization("stored token is blank".into()))?;

        Ok(Some(TokenRecord::new(token, SCOPE, saved_at)))
    }

    async fn save_token(&self, record: &TokenRecord) -> Result<(), StorageError> {
        if record.scope != SCOPE {
            return Err(StorageError::Conflict);
        }

        sqlx::query(
            r"
            INSERT INTO auth_tokens (scope, token, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(scope) DO UPDATE SET
                token = excluded.token,
                saved_at = excluded.saved_at
            ",
        )
        .bind(SCOPE.as_str())
        .bind(record.token.expose())
        .bind(record.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_token(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM auth_tokens WHERE scope = ?1")
            .bind(SCOPE.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
