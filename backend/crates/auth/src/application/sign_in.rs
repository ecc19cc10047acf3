//! Sign In Use Case
//!
//! Authenticates a user and mints the session principal. Failures mutate
//! nothing.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::credentials;
use crate::application::session::SessionCodec;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// One-time passcode (if 2FA is active on the account)
    pub otp: Option<String>,
}

/// Sign in output
pub struct SignInOutput {
    /// Signed session token for the cookie
    pub session_token: String,
    pub user_id: UserId,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    codec: SessionCodec,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            codec: SessionCodec::new(config),
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        // Form-level validation happens before any credential work;
        // malformed input is reported as such, not as a failed login.
        Email::new(&input.email).map_err(|e| AuthError::Validation(e.message().to_string()))?;
        RawPassword::new(input.password.clone())
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let user = credentials::verify(
            self.user_repo.as_ref(),
            &input.email,
            &input.password,
            input.otp.as_deref(),
        )
        .await?;

        let session_token = self.codec.mint(user.id, &user.email)?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok(SignInOutput {
            session_token,
            user_id: user.id,
        })
    }
}
