/// Bearer token authentication
///
/// [`require_auth`] guards every protected route. It reads
/// `Authorization: Bearer <token>`, resolves the token through the
/// [`TokenService`](tasknest_shared::auth::tokens::TokenService) and stores
/// an [`AuthContext`] in the request extensions. Any failure stops the
/// request with 401 "Please authenticate", whatever the actual reason.
///
/// Handlers read the identity with `Extension<AuthContext>`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tasknest_shared::auth::{context::AuthContext, tokens::AuthError};

use crate::{app::AppState, error::ApiError};

/// Pulls the token out of an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Header is not valid text".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// Authentication layer for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.to_string();

    let user = state.tokens.validate(&token).await?;

    req.extensions_mut().insert(AuthContext::new(user, token));

    Ok(next.run(req).await)
}
