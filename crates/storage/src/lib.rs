#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryTokenRepository, Storage, StorageError, TokenRecord, TokenRepository};
pub use sqlite::{SqliteInitError, SqliteRepository};
