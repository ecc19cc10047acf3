//! Change Password Use Case
//!
//! For signed-in users only. The current password is re-verified before the
//! new hash is stored; the old password stops working immediately after.

use std::sync::Arc;

use crate::application::session::SessionPrincipal;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Change password input
pub struct ChangePasswordInput {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

/// Change password use case
pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// The caller must have verified the principal; it is threaded in
    /// explicitly rather than read from ambient state.
    pub async fn execute(
        &self,
        principal: &SessionPrincipal,
        input: ChangePasswordInput,
    ) -> AuthResult<()> {
        let current = RawPassword::new(input.current_password)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let new_password = RawPassword::new_confirmed(input.password, &input.password_confirm)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let user = self
            .user_repo
            .find_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.verify_password(&current) {
            return Err(AuthError::Unauthorized);
        }

        let password_hash =
            UserPassword::from_raw(&new_password).map_err(|e| AuthError::Internal(e.to_string()))?;

        self.user_repo
            .update_password(user.id, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "Password changed");

        Ok(())
    }
}
