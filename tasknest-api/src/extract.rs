/// Request extractors
///
/// [`ApiJson`] behaves like `axum::Json` but rejects malformed bodies with an
/// [`ApiError`] so they get the same JSON error shape as everything else.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor with API-style rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
