//! Session Minting and Verification
//!
//! The session principal is the pair `{ user id, email }`, carried in a
//! stateless HMAC-signed token (cookie value). Logout is a cookie clear;
//! nothing is stored server-side.
//!
//! Token shape: `base64url(claims JSON) . base64url(HMAC-SHA256 signature)`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::application::config::AuthConfig;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// The verified identity claims attached to a request
#[derive(Debug, Clone)]
pub struct SessionPrincipal {
    pub user_id: UserId,
    pub email: Email,
}

/// Signed claims payload
#[derive(Serialize, Deserialize)]
struct SessionClaims {
    /// User id
    sub: i32,
    /// User email
    email: String,
    /// Expiry (unix seconds)
    exp: i64,
}

/// Mints and verifies session tokens
#[derive(Clone)]
pub struct SessionCodec {
    config: Arc<AuthConfig>,
}

impl SessionCodec {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Mint a signed session token for a freshly verified user
    pub fn mint(&self, user_id: UserId, email: &Email) -> AuthResult<String> {
        let ttl = chrono::Duration::from_std(self.config.session_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;

        let claims = SessionClaims {
            sub: user_id.as_i32(),
            email: email.as_str().to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| AuthError::Internal(format!("Failed to encode claims: {e}")))?,
        );

        let mut mac = HmacSha256::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            payload,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify a session token and extract the principal
    ///
    /// Shape, signature, and expiry failures are indistinguishable to the
    /// caller.
    pub fn verify(&self, token: &str) -> AuthResult<SessionPrincipal> {
        let (payload, signature_b64) = token.split_once('.').ok_or(AuthError::Unauthorized)?;

        let mut mac = HmacSha256::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Unauthorized)?;

        mac.verify_slice(&signature)
            .map_err(|_| AuthError::Unauthorized)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Unauthorized)?;

        let claims: SessionClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| AuthError::Unauthorized)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Unauthorized);
        }

        Ok(SessionPrincipal {
            user_id: UserId::from_raw(claims.sub),
            email: Email::from_db(claims.email),
        })
    }
}
