//! TOTP Setup Use Case
//!
//! Enrollment lifecycle for the second factor: generate a shared secret,
//! confirm it with a passcode to activate, or drop it entirely.

use std::sync::Arc;

use crate::application::session::SessionPrincipal;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::totp_secret::TotpSecret;
use crate::error::{AuthError, AuthResult};

/// TOTP setup output
pub struct TotpSetupOutput {
    /// otpauth:// provisioning URI for the enrollment code
    pub otpauth_url: String,
}

/// TOTP setup use case
pub struct TotpSetupUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> TotpSetupUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Return the provisioning URI, generating and persisting a secret on
    /// first call
    ///
    /// Idempotent until activation: repeated calls hand back the same
    /// underlying secret instead of rotating it away from an authenticator
    /// app that already scanned it.
    pub async fn generate(&self, principal: &SessionPrincipal) -> AuthResult<TotpSetupOutput> {
        let user = self
            .user_repo
            .find_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let secret = match &user.two_factor_secret {
            Some(existing) => existing.clone(),
            None => {
                let secret = TotpSecret::generate();
                self.user_repo
                    .set_two_factor_secret(user.id, &secret)
                    .await?;

                tracing::info!(user_id = %user.id, "TOTP secret generated");
                secret
            }
        };

        let otpauth_url = secret
            .provisioning_uri(user.email.as_str())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(TotpSetupOutput { otpauth_url })
    }

    /// Confirm the passcode and flip the activation flag
    ///
    /// Without a previously generated secret this is a no-op; an invalid
    /// passcode mutates nothing.
    pub async fn activate(&self, principal: &SessionPrincipal, otp: &str) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(secret) = &user.two_factor_secret {
            let valid = secret
                .check(otp, user.email.as_str())
                .map_err(|e| AuthError::Internal(e.to_string()))?;

            if !valid {
                return Err(AuthError::OtpInvalid);
            }

            self.user_repo
                .set_two_factor_activated(user.id, true)
                .await?;

            tracing::info!(user_id = %user.id, "TOTP activated");
        }

        Ok(())
    }

    /// Clear the secret and the activation flag together
    ///
    /// No passcode re-confirmation is required; an active session is enough.
    pub async fn deactivate(&self, principal: &SessionPrincipal) -> AuthResult<()> {
        self.user_repo.clear_two_factor(principal.user_id).await?;

        tracing::info!(user_id = %principal.user_id, "TOTP deactivated");

        Ok(())
    }
}
