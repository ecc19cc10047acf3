//! Auth Router

use axum::{Router, routing::post};
use platform::mail::Mailer;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{ResetTokenRepository, UserRepository};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router<M>(repo: PgAuthRepository, mailer: M, config: AuthConfig) -> Router
where
    M: Mailer + Clone + Send + Sync + 'static,
{
    auth_router_generic(repo, mailer, config)
}

/// Create a generic Auth router for any repository/mailer implementation
pub fn auth_router_generic<R, M>(repo: R, mailer: M, config: AuthConfig) -> Router
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/login/check", post(handlers::pre_login_check::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/change-password", post(handlers::change_password::<R, M>))
        .route("/password-reset", post(handlers::password_reset::<R, M>))
        .route("/password-update", post(handlers::password_update::<R, M>))
        .route("/2fa/generate", post(handlers::two_factor_generate::<R, M>))
        .route("/2fa/activate", post(handlers::two_factor_activate::<R, M>))
        .route(
            "/2fa/deactivate",
            post(handlers::two_factor_deactivate::<R, M>),
        )
        .with_state(state)
}
