//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (secure random material for tokens)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Outbound mail abstraction

pub mod cookie;
pub mod crypto;
pub mod mail;
pub mod password;
