//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, PreLoginCheckInput, PreLoginCheckUseCase,
    RequestPasswordResetUseCase, ResetPasswordInput, ResetPasswordUseCase, SessionCodec,
    SessionPrincipal, SignInInput, SignInUseCase, SignUpInput, SignUpUseCase, TotpSetupUseCase,
};
use crate::domain::repository::{ResetTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, PasswordResetRequest,
    PasswordUpdateRequest, PreLoginCheckRequest, PreLoginCheckResponse, RegisterRequest,
    TwoFactorActivateRequest, TwoFactorSecretResponse,
};
use crate::presentation::middleware::ACCOUNT_HOME_PATH;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.repo.clone());

    use_case
        .execute(SignUpInput {
            email: req.email,
            password: req.password,
            password_confirm: req.password_confirm,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Login (two-step)
// ============================================================================

/// POST /api/auth/login/check
///
/// Step one of the login protocol: reports whether the client must collect
/// a one-time passcode before calling `/login`.
pub async fn pre_login_check<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<PreLoginCheckRequest>,
) -> AuthResult<Json<PreLoginCheckResponse>>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = PreLoginCheckUseCase::new(state.repo.clone());

    let output = use_case
        .execute(PreLoginCheckInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(PreLoginCheckResponse {
        two_factor_activated: output.two_factor_activated,
    }))
}

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            otp: req.otp,
        })
        .await?;

    let cookie = state
        .config
        .session_cookie()
        .build_set_cookie(&output.session_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            redirect_to: ACCOUNT_HOME_PATH.to_string(),
        }),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
///
/// Sessions are stateless, so dropping the cookie is the whole operation.
pub async fn logout<R, M>(State(state): State<AuthAppState<R, M>>) -> impl IntoResponse
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let cookie = state.config.session_cookie().build_delete_cookie();

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

// ============================================================================
// Change Password (requires authentication)
// ============================================================================

/// POST /api/auth/change-password
pub async fn change_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers).ok_or(AuthError::Unauthorized)?;

    let use_case = ChangePasswordUseCase::new(state.repo.clone());

    use_case
        .execute(
            &principal,
            ChangePasswordInput {
                current_password: req.current_password,
                password: req.password,
                password_confirm: req.password_confirm,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Password Reset (requires NO authentication)
// ============================================================================

/// POST /api/auth/password-reset
///
/// Always succeeds for well-formed input, whether or not the email is known.
pub async fn password_reset<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<PasswordResetRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers);

    let use_case = RequestPasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(principal.as_ref(), &req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/password-update
pub async fn password_update<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<PasswordUpdateRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers);

    let use_case = ResetPasswordUseCase::new(state.repo.clone());

    use_case
        .execute(
            principal.as_ref(),
            ResetPasswordInput {
                token: req.token,
                password: req.password,
                password_confirm: req.password_confirm,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Two-Factor (requires authentication)
// ============================================================================

/// POST /api/auth/2fa/generate
pub async fn two_factor_generate<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> AuthResult<Json<TwoFactorSecretResponse>>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers).ok_or(AuthError::Unauthorized)?;

    let use_case = TotpSetupUseCase::new(state.repo.clone());

    let output = use_case.generate(&principal).await?;

    Ok(Json(TwoFactorSecretResponse {
        two_factor_secret: output.otpauth_url,
    }))
}

/// POST /api/auth/2fa/activate
pub async fn two_factor_activate<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<TwoFactorActivateRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers).ok_or(AuthError::Unauthorized)?;

    let use_case = TotpSetupUseCase::new(state.repo.clone());

    use_case.activate(&principal, &req.otp).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/2fa/deactivate
pub async fn two_factor_deactivate<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> AuthResult<StatusCode>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let principal = current_principal(&state, &headers).ok_or(AuthError::Unauthorized)?;

    let use_case = TotpSetupUseCase::new(state.repo.clone());

    use_case.deactivate(&principal).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract and verify the session principal from the request cookie
fn current_principal<R, M>(
    state: &AuthAppState<R, M>,
    headers: &HeaderMap,
) -> Option<SessionPrincipal>
where
    R: UserRepository + ResetTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(headers, &state.config.session_cookie_name)?;

    SessionCodec::new(state.config.clone()).verify(&token).ok()
}
