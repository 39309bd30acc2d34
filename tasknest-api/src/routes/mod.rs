/// API route handlers
///
/// - `index`: README rendered as the landing page
/// - `health`: Health check endpoint
/// - `users`: Signup, login, logout and the caller's own profile
/// - `avatar`: Avatar upload, removal and public download
/// - `tasks`: The caller's tasks

use uuid::Uuid;

use crate::error::ApiError;

pub mod avatar;
pub mod health;
pub mod index;
pub mod tasks;
pub mod users;

/// Parses an `:id` path segment
///
/// Anything that is not an identifier cannot name a resource, so it is a 404
/// like any other missing record.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Not found".to_string()))
}
