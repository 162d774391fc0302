//! Argon2id password hashing.
//!
//! Implements the `PasswordHasher` port from `parley-core`. Digests are PHC
//! strings, so algorithm, parameters and salt travel with the hash.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};

use parley_core::auth::password::PasswordHasher;
use parley_types::error::AuthError;

/// Argon2id with the crate's default parameters and a fresh random salt per
/// hash.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "stored password digest is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_string_not_plaintext() {
        let hasher = Argon2PasswordHasher::new();
        let digest = hasher.hash("pw12345678").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("pw12345678"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = Argon2PasswordHasher::new();
        let a = hasher.hash("pw12345678").unwrap();
        let b = hasher.hash("pw12345678").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hasher = Argon2PasswordHasher::new();
        let digest = hasher.hash("pw12345678").unwrap();
        assert!(hasher.verify("pw12345678", &digest));
        assert!(!hasher.verify("pw12345679", &digest));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        let hasher = Argon2PasswordHasher::new();
        assert!(!hasher.verify("pw12345678", "not-a-phc-string"));
        assert!(!hasher.verify("pw12345678", ""));
    }
}
