/// Request-scoped identity
///
/// The authentication layer resolves the bearer token and stores an
/// `AuthContext` in the request extensions. Handlers extract it with
/// `Extension<AuthContext>`.

use crate::models::user::User;

/// Identity resolved from a bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user, as loaded during validation
    pub user: User,

    /// The raw token presented, needed to log out this one session
    pub token: String,
}

impl AuthContext {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }
}
