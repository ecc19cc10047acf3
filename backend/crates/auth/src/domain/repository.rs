//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entity::{
    reset_token::{IssuedResetToken, PasswordResetToken},
    user::{NewUser, User},
};
use crate::domain::value_object::{
    email::Email, reset_token_id::ResetTokenId, totp_secret::TotpSecret, user_id::UserId,
    user_password::UserPassword,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user, returning the stored row
    ///
    /// A duplicate email surfaces as `AuthError::DuplicateEmail`.
    async fn create(&self, user: &NewUser) -> AuthResult<User>;

    /// Find user by exact email match (case-sensitive)
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Replace the stored password hash
    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()>;

    /// Store a TOTP secret (does not touch the activation flag)
    async fn set_two_factor_secret(&self, user_id: UserId, secret: &TotpSecret) -> AuthResult<()>;

    /// Set the 2FA activation flag
    async fn set_two_factor_activated(&self, user_id: UserId, activated: bool) -> AuthResult<()>;

    /// Clear both the TOTP secret and the activation flag in one statement
    async fn clear_two_factor(&self, user_id: UserId) -> AuthResult<()>;
}

/// Password reset token repository trait
#[trait_variant::make(ResetTokenRepository: Send)]
pub trait LocalResetTokenRepository {
    /// Insert-or-replace the single live token for a user
    ///
    /// Must be one atomic statement (insert with on-conflict update), never
    /// a read-then-write, so concurrent requests cannot race the unique
    /// constraint.
    async fn upsert(&self, token: &IssuedResetToken) -> AuthResult<()>;

    /// Look up a token row by its bearer string
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<PasswordResetToken>>;

    /// Store the new password hash and delete the token row, atomically
    ///
    /// Both effects happen in one transaction; a consumed token must never
    /// remain usable.
    async fn consume(
        &self,
        token_id: ResetTokenId,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()>;
}
