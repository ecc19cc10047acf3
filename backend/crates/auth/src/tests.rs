//! Use-case tests for the auth crate
//!
//! The workflow use cases run against in-memory repositories and a
//! recording mailer, so every state transition is observable without a
//! database.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use platform::mail::{EmailMessage, MailError, Mailer};

use crate::application::config::AuthConfig;
use crate::application::session::SessionPrincipal;
use crate::domain::entity::{
    reset_token::{IssuedResetToken, PasswordResetToken},
    user::{NewUser, User},
};
use crate::domain::repository::{ResetTokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, reset_token_id::ResetTokenId, totp_secret::TotpSecret, user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// In-memory repository
// ============================================================================

struct StoredUser {
    id: i32,
    email: String,
    password_hash: String,
    two_factor_secret: Option<String>,
    two_factor_activated: bool,
    created_at: DateTime<Utc>,
}

struct StoredToken {
    id: i32,
    user_id: i32,
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<StoredUser>,
    next_user_id: i32,
    tokens: Vec<StoredToken>,
    next_token_id: i32,
}

#[derive(Clone, Default)]
struct MemoryRepo {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepo {
    fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    fn token_count(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }

    fn current_token(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .tokens
            .first()
            .map(|t| t.token.clone())
    }

    fn stored_secret(&self, user_id: UserId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == user_id.as_i32())
            .and_then(|u| u.two_factor_secret.clone())
    }

    fn stored_activated(&self, user_id: UserId) -> bool {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == user_id.as_i32())
            .map(|u| u.two_factor_activated)
            .unwrap_or(false)
    }
}

fn materialize(stored: &StoredUser) -> AuthResult<User> {
    let password_hash = UserPassword::from_phc_string(stored.password_hash.clone())
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let two_factor_secret = stored
        .two_factor_secret
        .clone()
        .map(TotpSecret::from_base32)
        .transpose()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(User {
        id: UserId::from_raw(stored.id),
        email: Email::from_db(stored.email.clone()),
        password_hash,
        two_factor_secret,
        two_factor_activated: stored.two_factor_activated,
        created_at: stored.created_at,
    })
}

impl UserRepository for MemoryRepo {
    async fn create(&self, user: &NewUser) -> AuthResult<User> {
        let mut state = self.state.lock().unwrap();

        // The unique constraint on users.email
        if state.users.iter().any(|u| u.email == user.email.as_str()) {
            return Err(AuthError::DuplicateEmail);
        }

        state.next_user_id += 1;
        let stored = StoredUser {
            id: state.next_user_id,
            email: user.email.as_str().to_string(),
            password_hash: user.password_hash.as_phc_string().to_string(),
            two_factor_secret: None,
            two_factor_activated: false,
            created_at: Utc::now(),
        };
        state.users.push(stored);

        materialize(state.users.last().expect("just pushed"))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email == email.as_str())
            .map(materialize)
            .transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.id == user_id.as_i32())
            .map(materialize)
            .transpose()
    }

    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id.as_i32()) {
            user.password_hash = password_hash.as_phc_string().to_string();
        }
        Ok(())
    }

    async fn set_two_factor_secret(&self, user_id: UserId, secret: &TotpSecret) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id.as_i32()) {
            user.two_factor_secret = Some(secret.as_base32().to_string());
        }
        Ok(())
    }

    async fn set_two_factor_activated(&self, user_id: UserId, activated: bool) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id.as_i32()) {
            user.two_factor_activated = activated;
        }
        Ok(())
    }

    async fn clear_two_factor(&self, user_id: UserId) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id.as_i32()) {
            user.two_factor_secret = None;
            user.two_factor_activated = false;
        }
        Ok(())
    }
}

impl ResetTokenRepository for MemoryRepo {
    async fn upsert(&self, token: &IssuedResetToken) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .tokens
            .iter_mut()
            .find(|t| t.user_id == token.user_id.as_i32())
        {
            existing.token = token.token.clone();
            existing.expires_at = token.expires_at;
            return Ok(());
        }

        state.next_token_id += 1;
        let stored = StoredToken {
            id: state.next_token_id,
            user_id: token.user_id.as_i32(),
            token: token.token.clone(),
            expires_at: token.expires_at,
        };
        state.tokens.push(stored);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<PasswordResetToken>> {
        let state = self.state.lock().unwrap();
        Ok(state.tokens.iter().find(|t| t.token == token).map(|t| {
            PasswordResetToken {
                id: ResetTokenId::from_raw(t.id),
                user_id: UserId::from_raw(t.user_id),
                token: t.token.clone(),
                expires_at: t.expires_at,
            }
        }))
    }

    async fn consume(
        &self,
        token_id: ResetTokenId,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();

        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id.as_i32()) {
            user.password_hash = password_hash.as_phc_string().to_string();
        }
        state.tokens.retain(|t| t.id != token_id.as_i32());

        Ok(())
    }
}

// ============================================================================
// Test mailers
// ============================================================================

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_message(&self) -> Option<EmailMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FailingMailer;

impl Mailer for FailingMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
        Err(MailError::Delivery("smtp unreachable".to_string()))
    }
}

// ============================================================================
// Test helpers
// ============================================================================

fn test_config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::development())
}

async fn register_user(repo: &Arc<MemoryRepo>, email: &str, password: &str) -> User {
    use crate::application::{SignUpInput, SignUpUseCase};

    SignUpUseCase::new(repo.clone())
        .execute(SignUpInput {
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password.to_string(),
        })
        .await
        .expect("registration should succeed");

    repo.find_by_email(&Email::new(email).unwrap())
        .await
        .unwrap()
        .expect("user should exist after registration")
}

fn principal_for(user: &User) -> SessionPrincipal {
    SessionPrincipal {
        user_id: user.id,
        email: user.email.clone(),
    }
}

/// Enroll and activate 2FA for a user, returning the stored secret
async fn activate_two_factor(repo: &Arc<MemoryRepo>, user: &User) -> TotpSecret {
    use crate::application::TotpSetupUseCase;

    let use_case = TotpSetupUseCase::new(repo.clone());
    let principal = principal_for(user);

    use_case.generate(&principal).await.unwrap();

    let secret = TotpSecret::from_base32(repo.stored_secret(user.id).unwrap()).unwrap();
    let code = secret.generate_current(user.email.as_str()).unwrap();

    use_case.activate(&principal, &code).await.unwrap();
    assert!(repo.stored_activated(user.id));

    secret
}

// ============================================================================
// Registration
// ============================================================================

#[cfg(test)]
mod register_tests {
    use super::*;
    use crate::application::{SignUpInput, SignUpUseCase};

    #[tokio::test]
    async fn test_register_success() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        assert_eq!(repo.user_count(), 1);
        assert_eq!(user.email.as_str(), "user@example.com");
        assert!(!user.two_factor_activated);
        assert!(user.two_factor_secret.is_none());
    }

    #[tokio::test]
    async fn test_register_password_mismatch_inserts_nothing() {
        let repo = Arc::new(MemoryRepo::default());

        let result = SignUpUseCase::new(repo.clone())
            .execute(SignUpInput {
                email: "user@example.com".to_string(),
                password: "password-one".to_string(),
                password_confirm: "password-two".to_string(),
            })
            .await;

        match result {
            Err(AuthError::Validation(message)) => {
                assert_eq!(message, "passwords do not match");
            }
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        }
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn test_register_short_password_reports_first_violation() {
        let repo = Arc::new(MemoryRepo::default());

        let result = SignUpUseCase::new(repo.clone())
            .execute(SignUpInput {
                email: "user@example.com".to_string(),
                password: "abc".to_string(),
                password_confirm: "something-else".to_string(),
            })
            .await;

        match result {
            Err(AuthError::Validation(message)) => {
                assert_eq!(message, "Password must contain at least 5 characters");
            }
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        }
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let repo = Arc::new(MemoryRepo::default());

        let result = SignUpUseCase::new(repo.clone())
            .execute(SignUpInput {
                email: "not-an-email".to_string(),
                password: "secret-password".to_string(),
                password_confirm: "secret-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let repo = Arc::new(MemoryRepo::default());
        register_user(&repo, "user@example.com", "secret-password").await;

        let result = SignUpUseCase::new(repo.clone())
            .execute(SignUpInput {
                email: "user@example.com".to_string(),
                password: "other-password".to_string(),
                password_confirm: "other-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
        assert_eq!(repo.user_count(), 1);
    }
}

// ============================================================================
// Login (two-step)
// ============================================================================

#[cfg(test)]
mod login_tests {
    use super::*;
    use crate::application::session::SessionCodec;
    use crate::application::{
        PreLoginCheckInput, PreLoginCheckUseCase, SignInInput, SignInUseCase,
    };

    #[tokio::test]
    async fn test_sign_in_without_second_factor() {
        let repo = Arc::new(MemoryRepo::default());
        let config = test_config();
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        let output = SignInUseCase::new(repo.clone(), config.clone())
            .execute(SignInInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: None,
            })
            .await
            .unwrap();

        // The minted session carries exactly the user id and email
        let principal = SessionCodec::new(config).verify(&output.session_token).unwrap();
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.email.as_str(), "user@example.com");
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let repo = Arc::new(MemoryRepo::default());
        let config = test_config();
        register_user(&repo, "user@example.com", "secret-password").await;

        let use_case = SignInUseCase::new(repo.clone(), config.clone());

        let unknown = use_case
            .execute(SignInInput {
                email: "ghost@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: None,
            })
            .await;

        let wrong = use_case
            .execute(SignInInput {
                email: "user@example.com".to_string(),
                password: "wrong-password".to_string(),
                otp: None,
            })
            .await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let repo = Arc::new(MemoryRepo::default());
        let config = test_config();
        register_user(&repo, "user@example.com", "secret-password").await;

        let result = SignInUseCase::new(repo.clone(), config)
            .execute(SignInInput {
                email: "User@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_pre_login_check_reports_second_factor() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        let use_case = PreLoginCheckUseCase::new(repo.clone());

        let output = use_case
            .execute(PreLoginCheckInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
            })
            .await
            .unwrap();
        assert!(!output.two_factor_activated);

        activate_two_factor(&repo, &user).await;

        let output = use_case
            .execute(PreLoginCheckInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
            })
            .await
            .unwrap();
        assert!(output.two_factor_activated);
    }

    #[tokio::test]
    async fn test_two_step_login_with_second_factor() {
        let repo = Arc::new(MemoryRepo::default());
        let config = test_config();
        let user = register_user(&repo, "user@example.com", "secret-password").await;
        let secret = activate_two_factor(&repo, &user).await;

        let use_case = SignInUseCase::new(repo.clone(), config.clone());

        // Step two skipped: no passcode supplied
        let missing = use_case
            .execute(SignInInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: None,
            })
            .await;
        assert!(matches!(missing, Err(AuthError::OtpRequired)));

        // Wrong passcode: no session is produced
        let wrong = use_case
            .execute(SignInInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: Some("000000".to_string()),
            })
            .await;
        assert!(matches!(wrong, Err(AuthError::OtpInvalid)));

        // Current-window passcode completes the login
        let code = secret.generate_current(user.email.as_str()).unwrap();
        let output = use_case
            .execute(SignInInput {
                email: "user@example.com".to_string(),
                password: "secret-password".to_string(),
                otp: Some(code),
            })
            .await
            .unwrap();

        let principal = SessionCodec::new(config).verify(&output.session_token).unwrap();
        assert_eq!(principal.user_id, user.id);
    }
}

// ============================================================================
// Change password
// ============================================================================

#[cfg(test)]
mod change_password_tests {
    use super::*;
    use crate::application::credentials;
    use crate::application::{ChangePasswordInput, ChangePasswordUseCase};

    #[tokio::test]
    async fn test_change_password_wrong_current_is_unauthorized() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "old-password").await;

        let result = ChangePasswordUseCase::new(repo.clone())
            .execute(
                &principal_for(&user),
                ChangePasswordInput {
                    current_password: "not-the-password".to_string(),
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::Unauthorized)));

        // Old password still works
        assert!(
            credentials::verify_password(repo.as_ref(), "user@example.com", "old-password")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_change_password_old_password_stops_working() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "old-password").await;

        ChangePasswordUseCase::new(repo.clone())
            .execute(
                &principal_for(&user),
                ChangePasswordInput {
                    current_password: "old-password".to_string(),
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await
            .unwrap();

        let old = credentials::verify_password(repo.as_ref(), "user@example.com", "old-password")
            .await;
        assert!(matches!(old, Err(AuthError::InvalidCredentials)));

        assert!(
            credentials::verify_password(repo.as_ref(), "user@example.com", "new-password")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_change_password_validates_new_pair() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "old-password").await;

        let result = ChangePasswordUseCase::new(repo.clone())
            .execute(
                &principal_for(&user),
                ChangePasswordInput {
                    current_password: "old-password".to_string(),
                    password: "new-password".to_string(),
                    password_confirm: "different".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
    }
}

// ============================================================================
// Password reset
// ============================================================================

#[cfg(test)]
mod reset_tests {
    use super::*;
    use crate::application::{
        RequestPasswordResetUseCase, ResetPasswordInput, ResetPasswordUseCase, credentials,
    };

    fn request_use_case(
        repo: &Arc<MemoryRepo>,
        mailer: &Arc<RecordingMailer>,
    ) -> RequestPasswordResetUseCase<MemoryRepo, MemoryRepo, RecordingMailer> {
        RequestPasswordResetUseCase::new(
            repo.clone(),
            repo.clone(),
            mailer.clone(),
            test_config(),
        )
    }

    #[tokio::test]
    async fn test_request_for_unknown_email_is_silent() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());

        let result = request_use_case(&repo, &mailer)
            .execute(None, "ghost@example.com")
            .await;

        // Success with no observable difference: no row, no mail
        assert!(result.is_ok());
        assert_eq!(repo.token_count(), 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_request_creates_token_and_mails_link() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&repo, "user@example.com", "secret-password").await;

        request_use_case(&repo, &mailer)
            .execute(None, "user@example.com")
            .await
            .unwrap();

        assert_eq!(repo.token_count(), 1);
        assert_eq!(mailer.sent_count(), 1);

        let token = repo.current_token().unwrap();
        assert_eq!(token.len(), 64);

        let message = mailer.last_message().unwrap();
        assert_eq!(message.to, "user@example.com");
        assert_eq!(message.subject, "Your password reset request");
        assert!(message.html_body.contains(&token));
        assert!(message.html_body.contains("/update-password?token="));
    }

    #[tokio::test]
    async fn test_second_request_replaces_the_token() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&repo, "user@example.com", "secret-password").await;

        let use_case = request_use_case(&repo, &mailer);

        use_case.execute(None, "user@example.com").await.unwrap();
        let first = repo.current_token().unwrap();

        use_case.execute(None, "user@example.com").await.unwrap();
        let second = repo.current_token().unwrap();

        // Still one row, holding the newer token
        assert_eq!(repo.token_count(), 1);
        assert_ne!(first, second);
        assert_eq!(mailer.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_request_rejected_while_signed_in() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        let result = request_use_case(&repo, &mailer)
            .execute(Some(&principal_for(&user)), "user@example.com")
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyLoggedIn)));
        assert_eq!(repo.token_count(), 0);
    }

    #[tokio::test]
    async fn test_mail_failure_surfaces_immediately() {
        let repo = Arc::new(MemoryRepo::default());
        register_user(&repo, "user@example.com", "secret-password").await;

        let use_case = RequestPasswordResetUseCase::new(
            repo.clone(),
            repo.clone(),
            Arc::new(FailingMailer),
            test_config(),
        );

        let result = use_case.execute(None, "user@example.com").await;
        assert!(matches!(result, Err(AuthError::Mail(_))));
    }

    #[tokio::test]
    async fn test_consume_updates_password_and_deletes_token() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&repo, "user@example.com", "old-password").await;

        request_use_case(&repo, &mailer)
            .execute(None, "user@example.com")
            .await
            .unwrap();
        let token = repo.current_token().unwrap();

        ResetPasswordUseCase::new(repo.clone())
            .execute(
                None,
                ResetPasswordInput {
                    token: token.clone(),
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(repo.token_count(), 0);

        let old = credentials::verify_password(repo.as_ref(), "user@example.com", "old-password")
            .await;
        assert!(matches!(old, Err(AuthError::InvalidCredentials)));
        assert!(
            credentials::verify_password(repo.as_ref(), "user@example.com", "new-password")
                .await
                .is_ok()
        );

        // Delete-after-use: the same token cannot be replayed
        let replay = ResetPasswordUseCase::new(repo.clone())
            .execute(
                None,
                ResetPasswordInput {
                    token,
                    password: "third-password".to_string(),
                    password_confirm: "third-password".to_string(),
                },
            )
            .await;
        assert!(matches!(replay, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_consume_expired_token_fails() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "old-password").await;

        // Lazy expiry: the row still exists, only the lookup rejects it
        let expired = IssuedResetToken::issue(user.id, chrono::Duration::seconds(-1));
        repo.upsert(&expired).await.unwrap();

        let result = ResetPasswordUseCase::new(repo.clone())
            .execute(
                None,
                ResetPasswordInput {
                    token: expired.token,
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
        assert!(
            credentials::verify_password(repo.as_ref(), "user@example.com", "old-password")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_consume_rejected_while_signed_in() {
        let repo = Arc::new(MemoryRepo::default());
        let mailer = Arc::new(RecordingMailer::default());
        let user = register_user(&repo, "user@example.com", "old-password").await;

        request_use_case(&repo, &mailer)
            .execute(None, "user@example.com")
            .await
            .unwrap();
        let token = repo.current_token().unwrap();

        let result = ResetPasswordUseCase::new(repo.clone())
            .execute(
                Some(&principal_for(&user)),
                ResetPasswordInput {
                    token,
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::AlreadyLoggedIn)));
        // Token is left in place; only consumption deletes it
        assert_eq!(repo.token_count(), 1);
    }

    #[tokio::test]
    async fn test_consume_unknown_token_fails() {
        let repo = Arc::new(MemoryRepo::default());

        let result = ResetPasswordUseCase::new(repo.clone())
            .execute(
                None,
                ResetPasswordInput {
                    token: "ab".repeat(32),
                    password: "new-password".to_string(),
                    password_confirm: "new-password".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }
}

// ============================================================================
// Two-factor lifecycle
// ============================================================================

#[cfg(test)]
mod two_factor_tests {
    use super::*;
    use crate::application::TotpSetupUseCase;

    #[tokio::test]
    async fn test_generate_is_idempotent_before_activation() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;
        let use_case = TotpSetupUseCase::new(repo.clone());
        let principal = principal_for(&user);

        let first = use_case.generate(&principal).await.unwrap();
        let secret_after_first = repo.stored_secret(user.id).unwrap();

        let second = use_case.generate(&principal).await.unwrap();
        let secret_after_second = repo.stored_secret(user.id).unwrap();

        // Same underlying secret, same enrollment URI
        assert_eq!(secret_after_first, secret_after_second);
        assert_eq!(first.otpauth_url, second.otpauth_url);
        assert!(first.otpauth_url.starts_with("otpauth://totp/"));

        // Generation alone never activates
        assert!(!repo.stored_activated(user.id));
    }

    #[tokio::test]
    async fn test_activate_then_deactivate_clears_everything() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        activate_two_factor(&repo, &user).await;
        assert!(repo.stored_activated(user.id));
        assert!(repo.stored_secret(user.id).is_some());

        TotpSetupUseCase::new(repo.clone())
            .deactivate(&principal_for(&user))
            .await
            .unwrap();

        // Secret and flag drop together
        assert!(!repo.stored_activated(user.id));
        assert!(repo.stored_secret(user.id).is_none());
    }

    #[tokio::test]
    async fn test_activate_with_wrong_code_mutates_nothing() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;
        let use_case = TotpSetupUseCase::new(repo.clone());
        let principal = principal_for(&user);

        use_case.generate(&principal).await.unwrap();

        let result = use_case.activate(&principal, "000000").await;
        assert!(matches!(result, Err(AuthError::OtpInvalid)));
        assert!(!repo.stored_activated(user.id));
    }

    #[tokio::test]
    async fn test_activate_without_secret_is_a_noop() {
        let repo = Arc::new(MemoryRepo::default());
        let user = register_user(&repo, "user@example.com", "secret-password").await;

        let result = TotpSetupUseCase::new(repo.clone())
            .activate(&principal_for(&user), "123456")
            .await;

        assert!(result.is_ok());
        assert!(!repo.stored_activated(user.id));
    }
}
