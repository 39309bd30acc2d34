use crate::auth::{password::PasswordError, tokens::AuthError};
use crate::models::{user::PatchError, FieldError};
use crate::store::StoreError;

/// Error type for account and task operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Field values failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Update named fields outside the whitelist
    #[error("Invalid updates!")]
    InvalidUpdates(Vec<String>),

    /// Wrong email or password; deliberately says which neither was
    #[error("Unable to login")]
    LoginFailed,

    /// Missing, or owned by someone else
    #[error("Not found")]
    NotFound,

    #[error("Email is already in use")]
    DuplicateEmail,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(AuthError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::MissingOwner => ServiceError::NotFound,
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => e.into(),
            AuthError::UnknownUser => ServiceError::NotFound,
            other => ServiceError::Token(other),
        }
    }
}

impl From<PatchError> for ServiceError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::Disallowed(keys) => ServiceError::InvalidUpdates(keys),
            PatchError::Invalid(details) => ServiceError::Validation(details),
        }
    }
}
