//! Password Reset Token Entity
//!
//! A time-limited bearer capability: possession of the token string alone
//! authorizes resetting the owning user's password within the validity
//! window. At most one live token exists per user; issuing again replaces
//! the previous one.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{reset_token_id::ResetTokenId, user_id::UserId};

/// Token size in bytes of CSPRNG output (hex-encoded for transport)
pub const RESET_TOKEN_BYTES: usize = 32;

/// A stored password reset token row
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: ResetTokenId,
    /// Owning user; unique, so one live token per user
    pub user_id: UserId,
    /// Hex-encoded bearer token
    pub token: String,
    /// Absolute expiry; the token is already invalid at this exact instant
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Expiry is evaluated lazily at lookup time; there is no sweeper.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// A freshly issued token, pending upsert; the database assigns the row id
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedResetToken {
    /// Issue a new token for a user
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn issue(user_id: UserId, ttl: Duration) -> Self {
        Self {
            user_id,
            token: platform::crypto::random_token_hex(RESET_TOKEN_BYTES),
            expires_at: Utc::now() + ttl,
        }
    }
}
