#![allow(dead_code)]

use anyhow::{ensure, Context, Result};
use chrono::Duration;
use serde_json::{json, Value};

use tasknest::auth::{PasswordHasher, TokenService};
use tasknest::config::DatabaseConfig;
use tasknest::{database, handlers, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Serve the app in-process on a free port with a fresh in-memory database,
/// so every test starts from a clean slate.
pub async fn spawn_app() -> Result<TestApp> {
    let db_config = DatabaseConfig {
        // Single connection: in-memory SQLite is private per connection
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connection_timeout: 5,
    };
    let pool = database::connect(&db_config).await?;
    database::migrate(&pool).await?;

    let state = AppState::new(
        pool,
        PasswordHasher::new(4),
        TokenService::new(TEST_SECRET, Duration::minutes(30)),
    );
    let app = handlers::router(state);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    })
}

/// Register an account and return its bearer token and user object.
pub async fn register(
    app: &TestApp,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(String, Value)> {
    let res = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "name": username,
            "password": password,
        }))
        .send()
        .await?;

    ensure!(
        res.status().as_u16() == 201,
        "register {} failed with {}",
        username,
        res.status()
    );

    let body: Value = res.json().await?;
    let token = body["access_token"]
        .as_str()
        .context("missing access_token")?
        .to_string();
    Ok((token, body["user"].clone()))
}
