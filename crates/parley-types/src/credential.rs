//! Bearer credential claims.
//!
//! Credentials are value objects: a signed claim payload plus the window in
//! which it is valid. Nothing about them is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two credential kinds a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Access,
    Refresh,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Access => write!(f, "access"),
            CredentialKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signed claim payload: `{"sub": email, "exp": epoch seconds, "type": kind}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
}

/// A freshly signed credential together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub kind: CredentialKind,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh credential issued together on login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedCredential,
    pub refresh: IssuedCredential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_wire_format() {
        let claims = CredentialClaims {
            sub: "alice@example.com".to_string(),
            exp: 1_700_000_000,
            kind: CredentialKind::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "alice@example.com");
        assert_eq!(json["exp"], 1_700_000_000_i64);
        assert_eq!(json["type"], "refresh");
    }

    #[test]
    fn test_claims_reject_unknown_kind() {
        let raw = r#"{"sub":"a@b.c","exp":1,"type":"admin"}"#;
        assert!(serde_json::from_str::<CredentialClaims>(raw).is_err());
    }
}
