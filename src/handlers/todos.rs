use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::database::models::Todo;
use crate::database::todos::{NewTodo, TodoChanges};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// GET /api/todos
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.todos().list(user.id).await?;
    Ok(Json(todos))
}

/// GET /api/todos/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.todos().get(user.id, id).await?;
    Ok(Json(todo))
}

/// POST /api/todos - the owner comes from the resolved identity; any owner
/// field in the payload is ignored.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    if new.text.trim().is_empty() {
        return Err(ApiError::validation("text cannot be empty"));
    }

    let todo = state.todos().create(user.id, new).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// PUT /api/todos/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<TodoChanges>,
) -> Result<Json<Todo>, ApiError> {
    if let Some(text) = &changes.text {
        if text.trim().is_empty() {
            return Err(ApiError::validation("text cannot be empty"));
        }
    }

    let todo = state.todos().update(user.id, id, changes).await?;
    Ok(Json(todo))
}

/// DELETE /api/todos/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.todos().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/todos/completed/clear
pub async fn clear_completed(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.todos().delete_completed(user.id).await?;
    tracing::info!(user = %user.username, deleted, "cleared completed todos");
    Ok(StatusCode::NO_CONTENT)
}
