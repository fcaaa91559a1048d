use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::database::models::User;
use crate::error::ApiError;
use crate::AppState;

/// The live account resolved from the request's bearer token. This is the
/// sole admissible owner reference for every store operation downstream.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Token-to-identity guard for protected routes.
///
/// Resolves bearer token -> verified subject -> live account, and injects
/// the result as a request extension. A missing, malformed or expired token
/// and a token whose subject no longer exists all fail identically, so a
/// caller can't probe which accounts exist.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("authentication required"))?;

    let username = state
        .tokens
        .verify(&token)
        .map_err(|_| ApiError::unauthorized("authentication required"))?;

    // Database trouble stays a 500; only identity failures collapse to 401
    let user = state
        .users()
        .find_by_username(&username)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("authentication required"))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(bearer_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }
}
