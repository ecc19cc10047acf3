//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;

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

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &NewUser) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING
                id,
                email,
                password_hash,
                two_factor_secret,
                two_factor_activated,
                created_at
            "#,
        )
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .fetch_one(&self.pool)
        .await?;

        row.into_user()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                email,
                password_hash,
                two_factor_secret,
                two_factor_activated,
                created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                email,
                password_hash,
                two_factor_secret,
                two_factor_activated,
                created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id.as_i32())
            .bind(password_hash.as_phc_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_two_factor_secret(&self, user_id: UserId, secret: &TotpSecret) -> AuthResult<()> {
        sqlx::query("UPDATE users SET two_factor_secret = $2 WHERE id = $1")
            .bind(user_id.as_i32())
            .bind(secret.as_base32())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_two_factor_activated(&self, user_id: UserId, activated: bool) -> AuthResult<()> {
        sqlx::query("UPDATE users SET two_factor_activated = $2 WHERE id = $1")
            .bind(user_id.as_i32())
            .bind(activated)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_two_factor(&self, user_id: UserId) -> AuthResult<()> {
        // Secret and flag drop together, keeping the activation invariant
        sqlx::query(
            "UPDATE users SET two_factor_secret = NULL, two_factor_activated = FALSE WHERE id = $1",
        )
        .bind(user_id.as_i32())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Reset Token Repository Implementation
// ============================================================================

impl ResetTokenRepository for PgAuthRepository {
    async fn upsert(&self, token: &IssuedResetToken) -> AuthResult<()> {
        // Single statement: concurrent requests for the same user land on
        // the unique user_id constraint, not on a second row
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET token = EXCLUDED.token,
                    expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(token.user_id.as_i32())
        .bind(&token.token)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r#"
            SELECT
                id,
                user_id,
                token,
                expires_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_token()))
    }

    async fn consume(
        &self,
        token_id: ResetTokenId,
        user_id: UserId,
        password_hash: &UserPassword,
    ) -> AuthResult<()> {
        // The password swap and the token delete must land together; a crash
        // between them would leave a spent token replayable
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id.as_i32())
            .bind(password_hash.as_phc_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE id = $1")
            .bind(token_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    password_hash: String,
    two_factor_secret: Option<String>,
    two_factor_activated: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        let two_factor_secret = self
            .two_factor_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(User {
            id: UserId::from_raw(self.id),
            email: Email::from_db(self.email),
            password_hash,
            two_factor_secret,
            two_factor_activated: self.two_factor_activated,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: i32,
    user_id: i32,
    token: String,
    expires_at: DateTime<Utc>,
}

impl ResetTokenRow {
    fn into_token(self) -> PasswordResetToken {
        PasswordResetToken {
            id: ResetTokenId::from_raw(self.id),
            user_id: UserId::from_raw(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
        }
    }
}
