use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::require_auth;
use crate::AppState;

pub mod auth;
pub mod notes;
pub mod todos;

/// Assemble the full route table. Everything under the protected group runs
/// behind the token guard; the rest is public.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_protected_routes())
        .merge(todo_routes())
        .merge(note_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

fn auth_protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/change-password", put(auth::change_password))
        .route("/api/auth/account", delete(auth::delete_account))
}

fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/todos", get(todos::list).post(todos::create))
        .route("/api/todos/completed/clear", delete(todos::clear_completed))
        .route(
            "/api/todos/:id",
            get(todos::get).put(todos::update).delete(todos::remove),
        )
}

fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(notes::list).post(notes::create))
        .route(
            "/api/notes/:id",
            get(notes::get).put(notes::update).delete(notes::remove),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "tasknest",
        "version": version,
        "description": "Personal task and note API with token-based authentication",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public), /api/auth/* (protected)",
            "todos": "/api/todos[/:id] (protected)",
            "notes": "/api/notes[/:id] (protected)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::health_check(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
