//! Cryptographic Utilities
//!
//! Secure random material for bearer tokens and signing secrets.

use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a random bearer token: `len` bytes of CSPRNG output, hex-encoded
///
/// The returned string is `2 * len` lowercase hex characters. 32 bytes
/// (256 bits of randomness) is the standard size for reset tokens.
pub fn random_token_hex(len: usize) -> String {
    to_hex(&random_bytes(len))
}

/// Encode bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(0).len(), 0);
        assert_eq!(random_bytes(16).len(), 16);
        assert_eq!(random_bytes(32).len(), 32);
    }

    #[test]
    fn test_random_bytes_not_all_zeros() {
        let bytes = random_bytes(32);
        assert!(
            bytes.iter().any(|&b| b != 0),
            "Random bytes should not be all zeros"
        );
    }

    #[test]
    fn test_random_token_hex_shape() {
        let token = random_token_hex(32);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!token.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_random_token_hex_unique() {
        // 256 bits of randomness never collide in practice
        let a = random_token_hex(32);
        let b = random_token_hex(32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_hex_known_value() {
        assert_eq!(to_hex(&[0xab, 0xcd, 0xef]), "abcdef");
        assert_eq!(to_hex(&[0x00, 0x01]), "0001");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &b[..3]));
    }
}
