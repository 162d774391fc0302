//! HS256 JWT codec.
//!
//! Implements the `TokenCodec` port from `parley-core` with `jsonwebtoken`.
//! Decoding checks signature, algorithm and the presence of `sub`, `exp`
//! and `type`; the expiry comparison itself belongs to `TokenService`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use parley_core::auth::token::TokenCodec;
use parley_types::credential::CredentialClaims;
use parley_types::error::AuthError;

/// Signs and verifies credentials with one process-wide HMAC secret.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Build a codec from the signing secret. An empty secret is rejected.
    pub fn new(secret: &SecretString) -> Result<Self, AuthError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(AuthError::Validation(
                "signing secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        })
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &CredentialClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<CredentialClaims, AuthError> {
        decode::<CredentialClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))
    }
}
