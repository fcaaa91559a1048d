use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::database::models::Note;
use crate::database::notes::{NewNote, NoteChanges};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 50;
const MAX_COLOR_LEN: usize = 20;

/// GET /api/notes
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.notes().list(user.id).await?;
    Ok(Json(notes))
}

/// GET /api/notes/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state.notes().get(user.id, id).await?;
    Ok(Json(note))
}

/// POST /api/notes
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(new): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    validate_title(&new.title)?;
    validate_optional(new.category.as_deref(), MAX_CATEGORY_LEN, "category")?;
    validate_optional(new.color.as_deref(), MAX_COLOR_LEN, "color")?;

    let note = state.notes().create(user.id, new).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/notes/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(changes): Json<NoteChanges>,
) -> Result<Json<Note>, ApiError> {
    if let Some(title) = &changes.title {
        validate_title(title)?;
    }
    validate_optional(changes.category.as_deref(), MAX_CATEGORY_LEN, "category")?;
    validate_optional(changes.color.as_deref(), MAX_COLOR_LEN, "color")?;

    let note = state.notes().update(user.id, id, changes).await?;
    Ok(Json(note))
}

/// DELETE /api/notes/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.notes().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::validation("title must be at most 200 characters"));
    }

    Ok(())
}

fn validate_optional(value: Option<&str>, max_len: usize, field: &str) -> Result<(), ApiError> {
    if let Some(value) = value {
        if value.len() > max_len {
            return Err(ApiError::validation(format!(
                "{field} must be at most {max_len} characters"
            )));
        }
    }

    Ok(())
}
