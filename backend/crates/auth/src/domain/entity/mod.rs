//! Entity Module

pub mod reset_token;
pub mod user;

pub use reset_token::{IssuedResetToken, PasswordResetToken, RESET_TOKEN_BYTES};
pub use user::{NewUser, User};
