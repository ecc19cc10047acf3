//! TOTP Secret Value Object
//!
//! Wraps the shared secret for time-based one-time passcodes.
//! Uses Google Authenticator compatible settings.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_ISSUER: &str = "Gatehouse";

/// TOTP shared secret for two-factor authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random TOTP secret
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_str = secret.into();
        // Validate by trying to decode
        Secret::Encoded(secret_str.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Self {
            secret_base32: secret_str,
        })
    }

    /// Get the base32-encoded secret for storage
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    /// Create a TOTP instance for this secret
    ///
    /// Skew of 1 tolerates one time step of clock drift either way.
    fn to_totp(&self, account_name: &str) -> AppResult<TOTP> {
        let secret = Secret::Encoded(self.secret_base32.clone());

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            1,
            TOTP_STEP,
            secret
                .to_bytes()
                .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Check a one-time passcode against the current time window
    pub fn check(&self, code: &str, account_name: &str) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// Get the otpauth:// provisioning URI for enrollment
    ///
    /// Embeds the secret, the account name, and the issuer label; the
    /// client renders it as a scannable code.
    pub fn provisioning_uri(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.get_url())
    }

    /// Generate the current passcode (for testing)
    #[cfg(test)]
    pub fn generate_current(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        totp.generate_current()
            .map_err(|e| AppError::internal(format!("Failed to generate TOTP: {}", e)))
    }
}
