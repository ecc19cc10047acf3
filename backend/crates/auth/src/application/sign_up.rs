//! Sign Up Use Case
//!
//! Creates a new user account.

use std::sync::Arc;

use crate::domain::entity::user::NewUser;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Sign up use case
pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Validate, hash, and insert
    ///
    /// Malformed input never reaches storage; a duplicate email surfaces
    /// from the unique constraint as [`AuthError::DuplicateEmail`].
    pub async fn execute(&self, input: SignUpInput) -> AuthResult<()> {
        let email = Email::new(&input.email)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let raw = RawPassword::new_confirmed(input.password, &input.password_confirm)
            .map_err(|e| AuthError::Validation(e.message().to_string()))?;

        let password_hash =
            UserPassword::from_raw(&raw).map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = self
            .user_repo
            .create(&NewUser {
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(())
    }
}
