//! User Password Value Object
//!
//! Domain value object for user passwords. Delegates to
//! `platform::password` for cryptographic operations.
//!
//! ## Usage
//! ```rust
//! use auth::models::{RawPassword, UserPassword};
//!
//! // Create from user input
//! let raw = RawPassword::new("correct horse".to_string())?;
//!
//! // Hash for storage
//! let hashed = UserPassword::from_raw(&raw)?;
//!
//! // Verify later
//! assert!(hashed.verify(&raw));
//! # Ok::<(), kernel::error::app_error::AppError>(())
//! ```

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordHashError};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input
///
/// Wrapper around `ClearTextPassword` with domain-specific error handling.
/// Memory is automatically zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password with validation
    ///
    /// The only policy rule is the length window; the error message is the
    /// first violated rule, ready to show to the user.
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text =
            ClearTextPassword::new(raw).map_err(|e| AppError::bad_request(e.to_string()))?;

        Ok(Self(clear_text))
    }

    /// Create a new raw password, additionally requiring a matching
    /// confirmation field
    ///
    /// Length is checked before the confirmation so the caller always gets
    /// the first violated rule.
    pub fn new_confirmed(raw: String, confirm: &str) -> AppResult<Self> {
        let matches = raw == confirm;
        let password = Self::new(raw)?;

        if !matches {
            return Err(AppError::bad_request("passwords do not match"));
        }

        Ok(password)
    }

    /// Access the inner ClearTextPassword
    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Hashed user password for database storage
///
/// Stores the password in Argon2id PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Create from raw password by hashing
    pub fn from_raw(raw: &RawPassword) -> AppResult<Self> {
        let hashed = raw.inner().hash().map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                AppError::internal(format!("Password hashing failed: {}", msg))
            }
            _ => AppError::internal("Unexpected error during password hashing"),
        })?;

        Ok(Self(hashed))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AppError::internal("Invalid password hash in database"))?;

        Ok(Self(hashed))
    }

    /// Get PHC string for database storage
    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    ///
    /// The underlying comparison is constant-time.
    pub fn verify(&self, raw: &RawPassword) -> bool {
        self.0.verify(raw.inner())
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
