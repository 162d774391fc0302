//! PasswordHasher trait for one-way credential digests.
//!
//! Defined in parley-core so services can hash and verify passwords without
//! coupling to a specific algorithm. The Argon2 adapter lives in parley-infra.

use parley_types::error::AuthError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// One-way password hashing. The digest is the only persisted form of a
/// password.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing digest (algorithm, parameters and salt
    /// included) for `plaintext`.
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// Check `plaintext` against a digest produced by [`hash`](Self::hash).
    /// A malformed digest verifies as `false`.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Reject passwords that do not meet the length policy.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
