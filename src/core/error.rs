//! Failure kinds the services report to the API layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no user with that email")]
    UnknownUser,

    #[error("user is inactive")]
    InactiveUser,

    #[error("password does not match")]
    InvalidCredentials,

    #[error("reset token is not valid")]
    InvalidResetToken,

    #[error("reset token has expired")]
    ExpiredResetToken,

    #[error("session token is missing, malformed or expired")]
    InvalidSession,

    #[error("new password must differ from the current one")]
    SamePassword,

    #[error("{0}")]
    Validation(String),

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}
