//! Reset Password Use Case
//!
//! Consumes a password reset token: stores the new hash and deletes the
//! token row in one transaction, so a consumed token can never be replayed.

use std::sync::Arc;

use crate::application::session::SessionPrincipal;
use crate::domain::repository::ResetTokenRepository;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Reset password input
pub struct ResetPasswordInput {
    /// Bearer token from the emailed link
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

/// Reset password use case
pub struct ResetPasswordUseCase<T>
where
    T: ResetTokenRepository,
{
    token_repo: Arc<T>,
}

impl<T> ResetPasswordUseCase<T>
where
    T: ResetTokenRepository,
{
    pub fn new(token_repo: Arc<T>) -> Self {
        Self { token_repo }
    }

    /// Checks run in order: token validity, then session absence, then the
    /// new password pair. A failure at any step leaves the token untouched.
    pub async fn execute(
        &self,
        principal: Option<&SessionPrincipal>,
        input: ResetPasswordInput,
    ) -> AuthResult<()> {
        let record = self
            .token_repo
            .find_by_token(&input.token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if record.is_expired() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        if principal.is_some() {
            return Err(AuthError::AlreadyLoggedIn);
        }

        let raw = RawPassword::new_confirmed(input.password, &input.password_confirm)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let password_hash =
            UserPassword::from_raw(&raw).map_err(|e| AuthError::Internal(e.to_string()))?;

        self.token_repo
            .consume(record.id, record.user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %record.user_id, "Password reset consumed");

        Ok(())
    }
}
