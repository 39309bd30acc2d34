/// Avatar endpoints
///
/// ```text
/// POST   /users/me/avatar    upload (multipart field "avatar")
/// DELETE /users/me/avatar    remove
/// GET    /users/:id/avatar   download as image/png (public)
/// ```
///
/// Uploads are sniffed and normalized before anything is stored; a file that
/// is not a supported image leaves the current avatar untouched.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use tasknest_shared::{auth::context::AuthContext, avatar};
use tracing::info;

use super::parse_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Name of the multipart field carrying the picture
pub const AVATAR_FIELD: &str = "avatar";

const MISSING_IMAGE_MESSAGE: &str = "Please upload an image";

/// `POST /users/me/avatar`
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<StatusCode> {
    let mut multipart =
        multipart.map_err(|_| ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(AVATAR_FIELD) {
            upload = Some(field.bytes().await?);
            break;
        }
    }

    let upload = upload
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()))?;

    let limit = state.config.upload.avatar_max_bytes;
    if upload.len() > limit {
        return Err(ApiError::BadRequest(format!(
            "Avatar must be at most {} bytes",
            limit
        )));
    }

    let png = avatar::normalize(upload.to_vec()).await?;
    state.accounts.set_avatar(&auth.user, png).await?;

    info!(user_id = %auth.user.id, "Avatar updated");
    Ok(StatusCode::OK)
}

/// `DELETE /users/me/avatar`
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.accounts.clear_avatar(&auth.user).await?;

    Ok(StatusCode::OK)
}

/// `GET /users/:id/avatar`
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_id(&id)?;
    let png = state.accounts.avatar(user_id).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
