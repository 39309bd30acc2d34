/// User account endpoints
///
/// ```text
/// POST   /users              signup            (public)
/// POST   /users/login        login             (public)
/// POST   /users/logout       end this session
/// POST   /users/logout-all   end every session
/// GET    /users/me           own profile
/// PATCH  /users/me           update own profile
/// DELETE /users/me           delete account and tasks
/// ```
///
/// Signup and login answer `{ "user": ..., "token": "..." }`. The user
/// representation never includes the password hash or the token list.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tasknest_shared::{
    auth::context::AuthContext,
    models::user::{NewUser, User},
};
use tracing::info;

use crate::{app::AppState, error::ApiResult, extract::ApiJson};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// `POST /users`
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state.accounts.create(input).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// `POST /users/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse { user, token }))
}

/// `POST /users/logout`
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.accounts.logout(&auth.user, &auth.token).await?;
    info!(user_id = %auth.user.id, "User logged out");

    Ok(StatusCode::OK)
}

/// `POST /users/logout-all`
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.accounts.logout_all(&auth.user).await?;
    info!(user_id = %auth.user.id, "User logged out everywhere");

    Ok(StatusCode::OK)
}

/// `GET /users/me`
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// `PATCH /users/me`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<Map<String, JsonValue>>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.update(&auth.user, body).await?;

    Ok(Json(user))
}

/// `DELETE /users/me`
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.remove(&auth.user).await?;

    Ok(Json(user))
}
