//! Pre-Login Check Use Case
//!
//! Step one of the two-step login protocol: check email + password only and
//! report whether the account requires a second factor, so the client knows
//! to collect a passcode before completing login.

use std::sync::Arc;

use crate::application::credentials;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;

/// Pre-login check input
pub struct PreLoginCheckInput {
    pub email: String,
    pub password: String,
}

/// Pre-login check output
pub struct PreLoginCheckOutput {
    /// Whether step two (passcode entry) is required
    pub two_factor_activated: bool,
}

/// Pre-login check use case
pub struct PreLoginCheckUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> PreLoginCheckUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, input: PreLoginCheckInput) -> AuthResult<PreLoginCheckOutput> {
        let user =
            credentials::verify_password(self.user_repo.as_ref(), &input.email, &input.password)
                .await?;

        Ok(PreLoginCheckOutput {
            two_factor_activated: user.two_factor_activated,
        })
    }
}
