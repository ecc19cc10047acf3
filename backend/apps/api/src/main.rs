//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::middleware::{RouteGuardState, route_guard};
use auth::{AuthConfig, PgAuthRepository, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
    response::Html,
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
use platform::mail::LogMailer;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Minimal shell for the client application; the route guard in front of
/// these pages is the part that matters server-side.
async fn page_shell() -> Html<&'static str> {
    Html(
        "<!doctype html>\
         <html><head><meta charset=\"utf-8\"><title>Gatehouse</title></head>\
         <body><div id=\"app\"></div></body></html>",
    )
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        // In production, load the session secret from environment
        let secret_b64 =
            env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in production");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        anyhow::ensure!(
            secret_bytes.len() == 32,
            "SESSION_SECRET must decode to 32 bytes"
        );
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&secret_bytes);
        AuthConfig {
            session_secret: secret,
            ..AuthConfig::default()
        }
    };

    if let Ok(base) = env::var("RESET_URL_BASE") {
        config.reset_url_base = base;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let config = auth_config()?;
    let guard_state = RouteGuardState::new(Arc::new(config.clone()));

    let repo = PgAuthRepository::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router; the route guard runs in front of every page route and
    // skips /api/* and asset paths by classification
    let app = Router::new()
        .route("/", get(page_shell))
        .route("/login", get(page_shell))
        .route("/register", get(page_shell))
        .route("/my-account", get(page_shell))
        .route("/change-password", get(page_shell))
        .route("/update-password", get(page_shell))
        .route("/password-reset", get(page_shell))
        .nest("/api/auth", auth_router(repo, LogMailer, config))
        .layer(axum::middleware::from_fn_with_state(
            guard_state,
            route_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
