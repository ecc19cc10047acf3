//! Credential Verifier
//!
//! Stateless checks of submitted credentials against the stored user row.
//! Pure read + compare; nothing here mutates state.
//!
//! Unknown email and wrong password both surface as
//! [`AuthError::InvalidCredentials`] so callers cannot probe for account
//! existence.

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Look up the user and check the password; no second-factor handling.
///
/// Used by the pre-login check to decide whether the client must collect a
/// passcode before completing login.
pub async fn verify_password<U>(repo: &U, email: &str, password: &str) -> AuthResult<User>
where
    U: UserRepository,
{
    let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let raw = RawPassword::new(password.to_string()).map_err(|_| AuthError::InvalidCredentials)?;

    if !user.verify_password(&raw) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Full credential check, including the second factor when active.
///
/// When the account has 2FA active, a passcode must be supplied
/// ([`AuthError::OtpRequired`] otherwise) and must validate within the
/// drift-tolerant time window ([`AuthError::OtpInvalid`] otherwise).
pub async fn verify<U>(
    repo: &U,
    email: &str,
    password: &str,
    otp: Option<&str>,
) -> AuthResult<User>
where
    U: UserRepository,
{
    let user = verify_password(repo, email, password).await?;

    if user.requires_second_factor() {
        let secret = user
            .two_factor_secret
            .as_ref()
            .ok_or_else(|| AuthError::Internal("2FA active without secret".to_string()))?;

        match otp {
            None => return Err(AuthError::OtpRequired),
            Some(code) => {
                let valid = secret
                    .check(code, user.email.as_str())
                    .map_err(|e| AuthError::Internal(e.to_string()))?;

                if !valid {
                    return Err(AuthError::OtpInvalid);
                }
            }
        }
    }

    Ok(user)
}
