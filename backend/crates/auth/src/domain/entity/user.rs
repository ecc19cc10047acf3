//! User Entity
//!
//! A single account row: identity, credential hash, and 2FA state.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email,
    totp_secret::TotpSecret,
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};

/// User entity
///
/// Invariant: `two_factor_activated` is only ever true while
/// `two_factor_secret` is present. Disabling 2FA clears both together.
#[derive(Debug, Clone)]
pub struct User {
    /// Database-assigned identifier (immutable)
    pub id: UserId,
    /// Unique email address, compared case-sensitively
    pub email: Email,
    /// Argon2id hash of the current password
    pub password_hash: UserPassword,
    /// TOTP shared secret, present once 2FA setup has begun
    pub two_factor_secret: Option<TotpSecret>,
    /// True only after a successful passcode confirmation
    pub two_factor_activated: bool,
    /// Created timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check a submitted password against the stored hash
    pub fn verify_password(&self, raw: &RawPassword) -> bool {
        self.password_hash.verify(raw)
    }

    /// Whether login must be completed with a one-time passcode
    pub fn requires_second_factor(&self) -> bool {
        self.two_factor_activated && self.two_factor_secret.is_some()
    }
}

/// A user pending insertion; the database assigns the id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: UserPassword,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(secret: Option<TotpSecret>, activated: bool) -> User {
        let raw = RawPassword::new("password".to_string()).unwrap();
        User {
            id: UserId::from_raw(1),
            email: Email::new("user@example.com").unwrap(),
            password_hash: UserPassword::from_raw(&raw).unwrap(),
            two_factor_secret: secret,
            two_factor_activated: activated,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_verify_password() {
        let user = user_with(None, false);
        let correct = RawPassword::new("password".to_string()).unwrap();
        let wrong = RawPassword::new("passwords".to_string()).unwrap();

        assert!(user.verify_password(&correct));
        assert!(!user.verify_password(&wrong));
    }

    #[test]
    fn test_requires_second_factor() {
        assert!(!user_with(None, false).requires_second_factor());
        assert!(!user_with(Some(TotpSecret::generate()), false).requires_second_factor());
        assert!(user_with(Some(TotpSecret::generate()), true).requires_second_factor());
    }
}
