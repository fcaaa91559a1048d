use chrono::Duration;
use tower_http::cors::CorsLayer;

use tasknest::auth::{PasswordHasher, TokenService};
use tasknest::config::Environment;
use tasknest::{config, database, handlers, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting tasknest in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        eprintln!("JWT_SECRET must be set (production refuses the dev default)");
        std::process::exit(1);
    }

    let pool = database::connect(&config.database)
        .await
        .expect("database connection");
    database::migrate(&pool).await.expect("schema migration");

    let state = AppState::new(
        pool,
        PasswordHasher::new(config.security.bcrypt_cost),
        TokenService::new(
            &config.security.jwt_secret,
            Duration::minutes(config.security.token_ttl_minutes),
        ),
    );

    let app = handlers::router(state);
    let app = if config.server.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    if matches!(config.environment, Environment::Development) {
        println!("🚀 tasknest listening on http://{}", bind_addr);
    }

    axum::serve(listener, app).await.expect("server");
}
