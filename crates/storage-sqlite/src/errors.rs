//! SQLite storage errors and their mapping onto core errors.

use diesel::r2d2::PoolError;
use nirogya_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    QueryFailed(#[from] diesel::result::Error),

    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolFailed(#[from] PoolError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Database writer unavailable: {0}")]
    WriterUnavailable(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        let database_error = match err {
            StorageError::QueryFailed(_) | StorageError::InvalidData(_) => {
                DatabaseError::QueryFailed(message)
            }
            StorageError::ConnectionFailed(_)
            | StorageError::PoolFailed(_)
            | StorageError::WriterUnavailable(_)
            | StorageError::Io(_) => DatabaseError::ConnectionFailed(message),
            StorageError::MigrationFailed(_) => DatabaseError::MigrationFailed(message),
        };
        Error::Storage(database_error)
    }
}
