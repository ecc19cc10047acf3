//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Register
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// ============================================================================
// Login (two-step)
// ============================================================================

/// Pre-login check request (step one)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreLoginCheckRequest {
    pub email: String,
    pub password: String,
}

/// Pre-login check response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreLoginCheckResponse {
    /// True if step two (passcode entry) must follow
    pub two_factor_activated: bool,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// One-time passcode if 2FA is active
    pub otp: Option<String>,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Where the client should navigate after the cookie is set
    pub redirect_to: String,
}

// ============================================================================
// Password change / reset
// ============================================================================

/// Change password request (session required)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

/// Password reset request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Password update request (consumes an emailed reset token)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// ============================================================================
// Two-factor
// ============================================================================

/// Two-factor secret response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSecretResponse {
    /// otpauth:// provisioning URI, rendered client-side as a QR code
    pub two_factor_secret: String,
}

/// Two-factor activate request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorActivateRequest {
    pub otp: String,
}
