use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::NewAccount;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: &'static str,
}

impl AuthResponse {
    fn new(user: User, access_token: String) -> Self {
        Self {
            user,
            access_token,
            token_type: "bearer",
        }
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(account): Json<NewAccount>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_username(&account.username)?;
    validate_email(&account.email)?;
    validate_password(&account.password)?;
    if account.name.trim().is_empty() {
        return Err(ApiError::validation("name cannot be empty"));
    }

    let (user, token) = state.auth().register(account).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = state
        .auth()
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(AuthResponse::new(user, token)))
}

/// GET /api/auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(update): Json<ProfileUpdateRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name cannot be empty"));
        }
    }

    let user = state.auth().update_profile(&user, update.name).await?;
    Ok(Json(user))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_password(&request.new_password)?;

    state
        .auth()
        .change_password(&user, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(json!({ "message": "password updated" })))
}

/// DELETE /api/auth/account
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    state.auth().delete_account(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 {
        return Err(ApiError::validation("username must be at least 3 characters"));
    }
    if username.len() > 50 {
        return Err(ApiError::validation("username must be less than 50 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::validation(
            "username can only contain letters, numbers, underscore, and hyphen",
        ));
    }
    // Must start with alphanumeric
    if !username.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return Err(ApiError::validation(
            "username must start with a letter or number",
        ));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err(ApiError::validation("invalid email format"));
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation("password must be at least 6 characters"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a-l_i9").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("_alice").is_err());
        assert!(validate_username("ali ce").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@nodot").is_err());
    }
}
