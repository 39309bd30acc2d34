/// Account operations
///
/// Signup, login and logout, profile changes, account deletion and avatar
/// storage. Mail side effects go through [`Notifications`] and never decide
/// whether an operation succeeded.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::ServiceError;
use crate::auth::{
    password::{hash_password, prepare_dummy_hash, verify_dummy, verify_password},
    tokens::TokenService,
};
use crate::models::{
    user::{normalize_email, CreateUser, NewUser, UpdateUser, User, UserPatch},
    FieldError,
};
use crate::notify::Notifications;
use crate::store::Store;

/// User account operations
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn Store>,
    tokens: TokenService,
    notifications: Notifications,
}

impl Accounts {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, notifications: Notifications) -> Self {
        prepare_dummy_hash();

        Self {
            store,
            tokens,
            notifications,
        }
    }

    /// Registers a user and signs them in
    ///
    /// Nothing is stored unless every field passes validation. Returns the new
    /// user and its first token.
    pub async fn create(&self, input: NewUser) -> Result<(User, String), ServiceError> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|e| ServiceError::Validation(FieldError::from_validation(&e)))?;

        let password_hash = hash_password(&input.password)?;

        let user = self
            .store
            .create_user(CreateUser {
                name: input.name,
                email: input.email,
                password_hash,
                age: input.age.unwrap_or(0),
            })
            .await?;

        info!(user_id = %user.id, "User signed up");
        self.notifications.send_welcome(&user.email, &user.name);

        let token = self.tokens.issue(&user).await?;
        Ok((user, token))
    }

    /// Checks an email and password pair
    ///
    /// Unknown email and wrong password both end in `LoginFailed`, after the
    /// same amount of hashing work.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            verify_dummy(password);
            return Err(ServiceError::LoginFailed);
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(ServiceError::LoginFailed),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                Err(ServiceError::LoginFailed)
            }
        }
    }

    /// Authenticates and issues a new token next to any existing ones
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ServiceError> {
        let user = self.authenticate(email, password).await?;
        let token = self.tokens.issue(&user).await?;

        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Ends the session that presented `token`
    pub async fn logout(&self, user: &User, token: &str) -> Result<(), ServiceError> {
        self.tokens.revoke(user, token).await?;
        Ok(())
    }

    /// Ends every session of `user`
    pub async fn logout_all(&self, user: &User) -> Result<(), ServiceError> {
        self.tokens.revoke_all(user).await?;
        Ok(())
    }

    /// Applies a profile patch given as a raw JSON object
    ///
    /// A key outside the whitelist rejects the whole body before anything is
    /// parsed. A new password is re-hashed before it is stored.
    pub async fn update(
        &self,
        user: &User,
        body: Map<String, JsonValue>,
    ) -> Result<User, ServiceError> {
        let patch = UserPatch::from_json(body)?;

        let password_hash = match patch.password {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let changes = UpdateUser {
            name: patch.name,
            email: patch.email,
            password_hash,
            age: patch.age,
        };

        if changes.is_empty() {
            return Ok(user.clone());
        }

        let updated = self
            .store
            .update_user(user.id, changes)
            .await?
            .ok_or(ServiceError::NotFound)?;

        info!(user_id = %user.id, "User profile updated");
        Ok(updated)
    }

    /// Deletes the user and every task they own
    ///
    /// Returns the record as it was before deletion.
    pub async fn remove(&self, user: &User) -> Result<User, ServiceError> {
        let tasks = self.store.delete_tasks_by_owner(user.id).await?;

        if !self.store.delete_user(user.id).await? {
            return Err(ServiceError::NotFound);
        }

        info!(user_id = %user.id, tasks_deleted = tasks, "User deleted");
        self.notifications.send_cancellation(&user.email, &user.name);

        Ok(user.clone())
    }

    /// Stores already-normalized avatar bytes
    pub async fn set_avatar(&self, user: &User, avatar: Vec<u8>) -> Result<(), ServiceError> {
        if !self.store.set_avatar(user.id, Some(avatar)).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    pub async fn clear_avatar(&self, user: &User) -> Result<(), ServiceError> {
        if !self.store.set_avatar(user.id, None).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    /// Avatar bytes of any user; `NotFound` if the user or the avatar is missing
    pub async fn avatar(&self, user_id: Uuid) -> Result<Vec<u8>, ServiceError> {
        self.store
            .find_user(user_id)
            .await?
            .and_then(|user| user.avatar)
            .ok_or(ServiceError::NotFound)
    }
}
