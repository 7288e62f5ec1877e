//! Password hashing for identity backends.
//!
//! Salted HMAC-SHA256 digests, base64-encoded. The scheme is an
//! implementation detail of the backends; handlers only ever see verify
//! results.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Generate a fresh random salt.
pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Hash a password with the given salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Verify a password against a stored digest.
pub fn verify_password(password: &str, salt: &str, expected: &str) -> bool {
    hash_password(password, salt) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let salt = generate_salt();
        let hash = hash_password("password", &salt);
        assert!(verify_password("password", &salt, &hash));
        assert!(!verify_password("Password", &salt, &hash));
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = hash_password("password", "salt-a");
        let b = hash_password("password", "salt-b");
        assert_ne!(a, b);
    }
}
