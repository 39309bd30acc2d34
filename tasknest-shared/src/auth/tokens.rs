/// Token Service
///
/// Issues bearer tokens and resolves them back to users. A token is accepted
/// only if
///
/// 1. its signature and issuer check out ([`super::jwt::decode_token`]),
/// 2. the user named in `sub` still exists, and
/// 3. the token string is still in that user's stored token list.
///
/// The stored list is the allow-list: logging out removes one entry, logging
/// out everywhere empties it. There is no expiry beyond that.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasknest_shared::auth::tokens::TokenService;
/// use tasknest_shared::store::{memory::MemoryStore, Store};
/// # use tasknest_shared::models::user::User;
///
/// # async fn example(user: User) -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// let tokens = TokenService::new("a-secret-of-at-least-thirty-two-bytes", store);
///
/// let token = tokens.issue(&user).await?;
/// let same_user = tokens.validate(&token).await?;
/// assert_eq!(same_user.id, user.id);
///
/// tokens.revoke(&user, &token).await?;
/// assert!(tokens.validate(&token).await.is_err());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::debug;

use super::jwt::{create_token, decode_token, Claims, TokenError};
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Why a bearer token was refused
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Signature or issuer check failed
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// Signed for a user that no longer exists
    #[error("Unknown user")]
    UnknownUser,

    /// Signed correctly but no longer in the user's token list
    #[error("Token has been revoked")]
    Revoked,

    /// Store lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues, validates and revokes bearer tokens
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<str>,
    store: Arc<dyn Store>,
}

impl TokenService {
    pub fn new(secret: impl Into<Arc<str>>, store: Arc<dyn Store>) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }

    /// Signs a new token for `user` and appends it to the user's token list
    ///
    /// Returns `AuthError::UnknownUser` if the user vanished in between.
    pub async fn issue(&self, user: &User) -> Result<String, AuthError> {
        let token = create_token(&Claims::new(user.id), &self.secret)?;

        if !self.store.push_token(user.id, &token).await? {
            return Err(AuthError::UnknownUser);
        }

        debug!(user_id = %user.id, "Issued token");
        Ok(token)
    }

    /// Resolves a token to its user if the token is still live
    pub async fn validate(&self, token: &str) -> Result<User, AuthError> {
        let claims = decode_token(token, &self.secret)?;

        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if !user.holds_token(token) {
            return Err(AuthError::Revoked);
        }

        Ok(user)
    }

    /// Removes one token from the user's list; other sessions stay valid
    pub async fn revoke(&self, user: &User, token: &str) -> Result<(), StoreError> {
        self.store.pull_token(user.id, token).await?;
        debug!(user_id = %user.id, "Revoked token");
        Ok(())
    }

    /// Removes every token the user holds
    pub async fn revoke_all(&self, user: &User) -> Result<(), StoreError> {
        self.store.clear_tokens(user.id).await?;
        debug!(user_id = %user.id, "Revoked all tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn setup() -> (TokenService, Arc<dyn Store>, User) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let user = store
            .create_user(CreateUser {
                name: "Mike".to_string(),
                email: "mike@example.com".to_string(),
                password_hash: "$argon2id$hash".to_string(),
                age: 0,
            })
            .await
            .unwrap();

        (TokenService::new(SECRET, store.clone()), store, user)
    }

    #[tokio::test]
    async fn test_issue_appends_in_order() {
        let (tokens, store, user) = setup().await;

        let first = tokens.issue(&user).await.unwrap();
        let second = tokens.issue(&user).await.unwrap();

        let stored = store.find_user(user.id).await.unwrap().unwrap().tokens;
        assert_eq!(stored, vec![first, second]);
    }

    #[tokio::test]
    async fn test_validate_resolves_user() {
        let (tokens, _, user) = setup().await;
        let token = tokens.issue(&user).await.unwrap();

        assert_eq!(tokens.validate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_revoke_only_one_session() {
        let (tokens, _, user) = setup().await;
        let phone = tokens.issue(&user).await.unwrap();
        let laptop = tokens.issue(&user).await.unwrap();

        tokens.revoke(&user, &phone).await.unwrap();

        assert!(matches!(tokens.validate(&phone).await, Err(AuthError::Revoked)));
        assert!(tokens.validate(&laptop).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_all() {
        let (tokens, _, user) = setup().await;
        let phone = tokens.issue(&user).await.unwrap();
        let laptop = tokens.issue(&user).await.unwrap();

        tokens.revoke_all(&user).await.unwrap();

        assert!(tokens.validate(&phone).await.is_err());
        assert!(tokens.validate(&laptop).await.is_err());
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let (tokens, store, user) = setup().await;

        // A token signed with another key, even if planted in the list
        let forged = create_token(&Claims::new(user.id), "another-secret-that-is-32-bytes-long").unwrap();
        store.push_token(user.id, &forged).await.unwrap();

        assert!(matches!(
            tokens.validate(&forged).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_user_rejected() {
        let (tokens, store, user) = setup().await;
        let token = tokens.issue(&user).await.unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(matches!(
            tokens.validate(&token).await,
            Err(AuthError::UnknownUser)
        ));
        assert!(matches!(tokens.issue(&user).await, Err(AuthError::UnknownUser)));
    }
}
