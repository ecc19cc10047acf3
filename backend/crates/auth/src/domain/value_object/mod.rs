//! Value Object Module

pub mod email;
pub mod reset_token_id;
pub mod totp_secret;
pub mod user_id;
pub mod user_password;

pub use email::Email;
pub use reset_token_id::ResetTokenId;
pub use totp_secret::TotpSecret;
pub use user_id::UserId;
pub use user_password::{RawPassword, UserPassword};
