//! Request Password Reset Use Case
//!
//! Issues a time-limited bearer token and hands the reset email payload to
//! the mail collaborator. The response is identical whether or not the
//! email belongs to an account, so the endpoint cannot be used to probe for
//! registered addresses.

use std::sync::Arc;

use platform::mail::{EmailMessage, Mailer};

use crate::application::config::AuthConfig;
use crate::application::session::SessionPrincipal;
use crate::domain::entity::reset_token::IssuedResetToken;
use crate::domain::repository::{ResetTokenRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Subject line of the reset email
const RESET_MAIL_SUBJECT: &str = "Your password reset request";

/// Request password reset use case
pub struct RequestPasswordResetUseCase<U, T, M>
where
    U: UserRepository,
    T: ResetTokenRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, T, M> RequestPasswordResetUseCase<U, T, M>
where
    U: UserRepository,
    T: ResetTokenRepository,
    M: Mailer,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    /// Resets can only be requested while signed out; a signed-in user
    /// changes their password instead.
    pub async fn execute(
        &self,
        principal: Option<&SessionPrincipal>,
        email: &str,
    ) -> AuthResult<()> {
        if principal.is_some() {
            return Err(AuthError::AlreadyLoggedIn);
        }

        let email =
            Email::new(email).map_err(|e| AuthError::Validation(e.message().to_string()))?;

        // Unknown address: succeed with no observable difference.
        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            return Ok(());
        };

        let ttl = chrono::Duration::from_std(self.config.reset_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid reset token TTL: {e}")))?;

        // One atomic upsert: a second request replaces the previous token
        // instead of adding a row or tripping the unique constraint.
        let issued = IssuedResetToken::issue(user.id, ttl);
        self.token_repo.upsert(&issued).await?;

        let reset_url = format!(
            "{}/update-password?token={}",
            self.config.reset_url_base, issued.token
        );

        let message = EmailMessage {
            to: email.as_str().to_string(),
            subject: RESET_MAIL_SUBJECT.to_string(),
            html_body: format!(
                "<h1>Hi, {email}!</h1>\
                 <p>You have requested to reset your password. \
                 Here is your password reset link, this link will expire in 1 hour.</p>\
                 <br>\
                 <a href=\"{reset_url}\">{reset_url}</a>"
            ),
        };

        self.mailer.send(&message).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(())
    }
}
