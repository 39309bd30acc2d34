/// Task endpoints
///
/// ```text
/// POST   /tasks        create
/// GET    /tasks        list (?completed=&limit=&skip=&sortBy=field:asc|desc)
/// GET    /tasks/:id    read
/// PATCH  /tasks/:id    update description/completed
/// DELETE /tasks/:id    delete
/// ```
///
/// All routes act on the caller's own tasks only. Someone else's task answers
/// 404 exactly like a missing one.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{Map, Value as JsonValue};
use tasknest_shared::{
    auth::context::AuthContext,
    models::task::{NewTask, Task, TaskListParams, TaskQuery},
};

use super::parse_id;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(&auth.user, input).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    params: Result<Query<TaskListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(params) = params?;
    let query = TaskQuery::try_from(params).map_err(ApiError::ValidationError)?;

    let tasks = state.tasks.list_for_owner(&auth.user, &query).await?;

    Ok(Json(tasks))
}

/// `GET /tasks/:id`
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.get(&auth.user, parse_id(&id)?).await?;

    Ok(Json(task))
}

/// `PATCH /tasks/:id`
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, JsonValue>>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.update(&auth.user, parse_id(&id)?, body).await?;

    Ok(Json(task))
}

/// `DELETE /tasks/:id`
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.remove(&auth.user, parse_id(&id)?).await?;

    Ok(Json(task))
}
