//! Error type shared by the multi-step ORM operations.
//!
//! Plain lookups return `diesel::result::Error` directly; operations that
//! validate input, check ownership or verify passwords before touching the
//! database return `DataError` so the HTTP layer can pick a status code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Password verification failed")]
    WrongPassword,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl DataError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DataError::Invalid(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DataError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DataError::Forbidden(msg.into())
    }
}
