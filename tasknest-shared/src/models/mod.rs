/// Data model for TaskNest
///
/// # Models
///
/// - `user`: User accounts, signup input and profile patches
/// - `task`: Owned tasks, creation input, patches and list queries
///
/// Both patch types follow the same rule: the body is checked against a
/// whitelist of keys first, and a single unknown key rejects the whole update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub mod task;
pub mod user;

/// One failed field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flattens `validator` output into field errors
    pub fn from_validation(errors: &validator::ValidationErrors) -> Vec<Self> {
        let mut details: Vec<Self> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        details
    }
}

/// Returns the keys of `body` that are not in `allowed`
///
/// An empty `Err` never happens: the call succeeds only when every key is
/// allowed.
pub(crate) fn check_whitelist(
    body: &Map<String, JsonValue>,
    allowed: &[&str],
) -> Result<(), Vec<String>> {
    let disallowed: Vec<String> = body
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .cloned()
        .collect();

    if disallowed.is_empty() {
        Ok(())
    } else {
        Err(disallowed)
    }
}

/// Rejects allowed keys that were sent as `null`
///
/// A `null` would otherwise deserialize to `None` and the field would be
/// silently left as it was.
pub(crate) fn reject_nulls(body: &Map<String, JsonValue>) -> Result<(), Vec<FieldError>> {
    let mut errors: Vec<FieldError> = body
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(key, _)| FieldError::new(key.as_str(), format!("{} must not be null", key)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(errors)
    }
}
