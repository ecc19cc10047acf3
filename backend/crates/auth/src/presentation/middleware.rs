//! Route Guard
//!
//! Evaluated before any page handler: a pure function of (session validity,
//! path class) deciding between pass-through and a redirect. It has no other
//! side effects.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::SessionCodec;

/// Auth-entry routes
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Private routes
pub const ACCOUNT_HOME_PATH: &str = "/my-account";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";

/// Classification of a requested path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Requires an authenticated session
    Private,
    /// Entry points that make no sense while signed in
    AuthEntry,
    /// Everything else
    Public,
}

/// Classify a request path; `None` means the path is excluded from guard
/// evaluation entirely (API and static asset paths).
pub fn classify_path(path: &str) -> Option<PathClass> {
    if path.starts_with("/api/") || path.starts_with("/assets/") || path == "/favicon.ico" {
        return None;
    }

    match path {
        ACCOUNT_HOME_PATH | CHANGE_PASSWORD_PATH => Some(PathClass::Private),
        LOGIN_PATH | REGISTER_PATH => Some(PathClass::AuthEntry),
        _ => Some(PathClass::Public),
    }
}

/// Outcome of the guard for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    PassThrough,
    RedirectToLogin,
    RedirectToAccount,
}

/// The transition table: anonymous visitors are kept off private pages,
/// signed-in visitors are kept off the auth entry pages.
pub fn guard_decision(authenticated: bool, class: Option<PathClass>) -> GuardDecision {
    match (authenticated, class) {
        (false, Some(PathClass::Private)) => GuardDecision::RedirectToLogin,
        (true, Some(PathClass::AuthEntry)) => GuardDecision::RedirectToAccount,
        _ => GuardDecision::PassThrough,
    }
}

/// Route guard middleware state
#[derive(Clone)]
pub struct RouteGuardState {
    pub config: Arc<AuthConfig>,
}

impl RouteGuardState {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }
}

/// Middleware applying [`guard_decision`] to every request
pub async fn route_guard(
    State(state): State<RouteGuardState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let authenticated =
        platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name)
            .map(|token| {
                SessionCodec::new(state.config.clone())
                    .verify(&token)
                    .is_ok()
            })
            .unwrap_or(false);

    match guard_decision(authenticated, classify_path(req.uri().path())) {
        GuardDecision::PassThrough => next.run(req).await,
        GuardDecision::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
        GuardDecision::RedirectToAccount => Redirect::to(ACCOUNT_HOME_PATH).into_response(),
    }
}
