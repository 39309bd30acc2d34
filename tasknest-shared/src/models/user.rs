/// User model, signup input and profile patches
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     tokens TEXT[] NOT NULL DEFAULT '{}',
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `User` serializes to its public shape only: the password hash, the token
/// list and the avatar bytes are never written out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{check_whitelist, reject_nulls, FieldError};
use crate::auth::password::validate_password_strength;

/// Fields a client may change through a profile update
pub const ALLOWED_USER_UPDATES: &[&str] = &["name", "email", "password", "age"];

/// User account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name (trimmed, non-empty)
    pub name: String,

    /// Email address, stored lower-cased
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Age in years
    pub age: i32,

    /// Live bearer tokens in issuance order
    #[serde(skip_serializing)]
    pub tokens: Vec<String>,

    /// Normalized PNG avatar
    #[serde(skip_serializing)]
    pub avatar: Option<Vec<u8>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether `token` is in this user's live token list
    pub fn holds_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// Input for inserting a user into the store
///
/// Carries the password hash, never the plaintext password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
}

/// Input for updating a stored user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

impl UpdateUser {
    /// True when no field would be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}

fn password_rules(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password).map_err(|message| {
        let mut error = ValidationError::new("password_rules");
        error.message = Some(message.into());
        error
    })
}

/// Signup request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(custom(function = "password_rules"))]
    pub password: String,

    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

impl NewUser {
    /// Trims text fields and lower-cases the email
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.password = self.password.trim().to_string();
        self
    }
}

/// Profile update with whitelisted fields only
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(custom(function = "password_rules"))]
    pub password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

impl UserPatch {
    /// Builds a patch from a raw JSON object
    ///
    /// Any key outside [`ALLOWED_USER_UPDATES`] rejects the whole object
    /// before a single field is read. The remaining fields are normalized and
    /// validated.
    pub fn from_json(body: Map<String, JsonValue>) -> Result<Self, PatchError> {
        check_whitelist(&body, ALLOWED_USER_UPDATES).map_err(PatchError::Disallowed)?;
        reject_nulls(&body).map_err(PatchError::Invalid)?;

        let patch: UserPatch = serde_json::from_value(JsonValue::Object(body))
            .map_err(|e| PatchError::Invalid(vec![FieldError::new("body", e.to_string())]))?;
        let patch = patch.normalized();

        patch
            .validate()
            .map_err(|e| PatchError::Invalid(FieldError::from_validation(&e)))?;

        Ok(patch)
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self.email = self.email.map(|email| normalize_email(&email));
        self.password = self.password.map(|password| password.trim().to_string());
        self
    }
}

/// Why a patch body was refused
#[derive(Debug, Clone, PartialEq)]
pub enum PatchError {
    /// Keys outside the whitelist
    Disallowed(Vec<String>),

    /// Allowed keys with bad values
    Invalid(Vec<FieldError>),
}

/// Trims and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
