/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`. The library errors convert
/// into `ApiError` with `?`, and `ApiError` renders as a JSON body with a
/// stable error code.
///
/// # Status codes
///
/// - 400: bad field values, invalid update keys, malformed bodies, duplicate
///   email, failed login
/// - 401: missing, invalid or revoked bearer token
/// - 404: missing resource, or one owned by someone else
/// - 500: storage and other unexpected failures (details are only logged)

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasknest_shared::{
    auth::tokens::AuthError, avatar::AvatarError, models::FieldError, services::ServiceError,
};

/// Message for every failed bearer authentication
pub const AUTHENTICATE_MESSAGE: &str = "Please authenticate";

/// Message for every failed login
pub const LOGIN_FAILED_MESSAGE: &str = "Unable to login";

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Field values failed validation (400)
    ValidationError(Vec<FieldError>),

    /// Update named keys outside the whitelist (400)
    InvalidUpdates(Vec<String>),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field problems, when there are any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InvalidUpdates(keys) => write!(f, "Invalid updates: {}", keys.join(", ")),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InvalidUpdates(keys) => (
                StatusCode::BAD_REQUEST,
                "invalid_updates",
                "Invalid updates!".to_string(),
                Some(
                    keys.into_iter()
                        .map(|key| FieldError::new(key, "Field cannot be updated"))
                        .collect(),
                ),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(details) => ApiError::ValidationError(details),
            ServiceError::InvalidUpdates(keys) => ApiError::InvalidUpdates(keys),
            ServiceError::LoginFailed => ApiError::BadRequest(LOGIN_FAILED_MESSAGE.to_string()),
            ServiceError::NotFound => ApiError::NotFound("Not found".to_string()),
            ServiceError::DuplicateEmail => {
                ApiError::BadRequest("Email is already in use".to_string())
            }
            other @ (ServiceError::Store(_)
            | ServiceError::Password(_)
            | ServiceError::Token(_)) => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Token failures all look the same to the client
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => ApiError::InternalError(format!("Token lookup failed: {}", e)),
            other => {
                tracing::debug!(reason = %other, "Authentication rejected");
                ApiError::Unauthorized(AUTHENTICATE_MESSAGE.to_string())
            }
        }
    }
}

impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::Empty | AvatarError::UnsupportedFormat | AvatarError::Decode(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AvatarError::Encode(_) | AvatarError::Internal(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::InvalidUpdates(vec!["_id".to_string(), "owner".to_string()]);
        assert_eq!(err.to_string(), "Invalid updates: _id, owner");
    }

    #[test]
    fn test_service_error_status() {
        let cases = [
            (ServiceError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidUpdates(vec!["_id".to_string()]), StatusCode::BAD_REQUEST),
            (ServiceError::LoginFailed, StatusCode::BAD_REQUEST),
            (ServiceError::DuplicateEmail, StatusCode::BAD_REQUEST),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_auth_errors_are_uniform() {
        for err in [AuthError::MissingCredentials, AuthError::Revoked, AuthError::UnknownUser] {
            match ApiError::from(err) {
                ApiError::Unauthorized(msg) => assert_eq!(msg, AUTHENTICATE_MESSAGE),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_avatar_errors() {
        assert!(matches!(
            ApiError::from(AvatarError::UnsupportedFormat),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(AvatarError::Internal("join".to_string())),
            ApiError::InternalError(_)
        ));
    }
}
