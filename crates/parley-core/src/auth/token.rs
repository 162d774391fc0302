//! Access/refresh credential issuance, verification and rotation.
//!
//! Signing is delegated to a [`TokenCodec`] (HS256 JWT in parley-infra); this
//! module owns the lifecycle rules: expiry windows, type discrimination and
//! subject resolution.

use chrono::{DateTime, Duration, Utc};
use tracing::Span;

use parley_types::credential::{CredentialClaims, CredentialKind, IssuedCredential, TokenPair};
use parley_types::error::AuthError;
use parley_types::user::User;

use super::store::CredentialStore;

/// Signs and decodes credential claims with the process-wide secret.
///
/// `decode` checks the signature, algorithm and claim structure only. Expiry
/// and credential kind are checked by [`TokenService`].
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &CredentialClaims) -> Result<String, AuthError>;

    /// Fails with `InvalidCredential` on a bad signature or malformed claims.
    fn decode(&self, token: &str) -> Result<CredentialClaims, AuthError>;
}

/// Stateless credential lifecycle.
pub struct TokenService<S: CredentialStore, C: TokenCodec> {
    store: S,
    codec: C,
    access_ttl: Duration,
    refresh_ttl: Duration,
    span: Span,
}

impl<S: CredentialStore, C: TokenCodec> TokenService<S, C> {
    /// Create a token service.
    ///
    /// Both lifetimes must be positive and the refresh lifetime must be
    /// strictly longer than the access lifetime.
    pub fn new(
        store: S,
        codec: C,
        access_ttl: Duration,
        refresh_ttl: Duration,
        span: Span,
    ) -> Result<Self, AuthError> {
        if access_ttl <= Duration::zero() {
            return Err(AuthError::Validation(
                "access credential lifetime must be positive".to_string(),
            ));
        }
        if refresh_ttl <= access_ttl {
            return Err(AuthError::Validation(
                "refresh credential lifetime must exceed access lifetime".to_string(),
            ));
        }

        Ok(Self {
            store,
            codec,
            access_ttl,
            refresh_ttl,
            span,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, subject: &str) -> Result<IssuedCredential, AuthError> {
        self.issue(subject, CredentialKind::Access, Utc::now())
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<IssuedCredential, AuthError> {
        self.issue(subject, CredentialKind::Refresh, Utc::now())
    }

    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        Ok(TokenPair {
            access: self.issue(subject, CredentialKind::Access, now)?,
            refresh: self.issue(subject, CredentialKind::Refresh, now)?,
        })
    }

    fn issue(
        &self,
        subject: &str,
        kind: CredentialKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, AuthError> {
        let ttl = match kind {
            CredentialKind::Access => self.access_ttl,
            CredentialKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;
        let claims = CredentialClaims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            kind,
        };
        let token = self.codec.sign(&claims)?;

        tracing::debug!(parent: &self.span, %kind, exp = claims.exp, "issued credential");

        Ok(IssuedCredential {
            token,
            kind,
            expires_at,
        })
    }

    /// Check signature, structure and expiry. Valid up to and including the
    /// `exp` second, expired strictly after.
    pub fn verify(&self, token: &str) -> Result<CredentialClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<CredentialClaims, AuthError> {
        let claims = self.codec.decode(token)?;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredential("missing subject".to_string()));
        }
        if now.timestamp() > claims.exp {
            return Err(AuthError::ExpiredCredential);
        }
        Ok(claims)
    }

    fn verify_kind(
        &self,
        token: &str,
        expected: CredentialKind,
    ) -> Result<CredentialClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.kind != expected {
            tracing::warn!(
                parent: &self.span,
                expected = %expected,
                presented = %claims.kind,
                "credential type mismatch"
            );
            return Err(AuthError::InvalidCredential(format!(
                "expected {expected} credential"
            )));
        }
        Ok(claims)
    }

    async fn resolve(&self, claims: &CredentialClaims) -> Result<User, AuthError> {
        match self.store.find_by_email(&claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => Err(AuthError::InvalidCredential("account is disabled".to_string())),
            None => Err(AuthError::InvalidCredential("unknown subject".to_string())),
        }
    }

    /// Resolve the user behind an access credential. Refresh credentials are
    /// rejected.
    #[tracing::instrument(name = "authenticate_bearer", parent = &self.span, skip_all)]
    pub async fn authenticate_bearer(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verify_kind(token, CredentialKind::Access)?;
        self.resolve(&claims).await
    }

    /// Exchange a refresh credential for a new access credential. Access
    /// credentials are rejected; the refresh credential itself is not renewed.
    #[tracing::instrument(name = "rotate_credential", parent = &self.span, skip_all)]
    pub async fn rotate(&self, refresh_token: &str) -> Result<IssuedCredential, AuthError> {
        let claims = self.verify_kind(refresh_token, CredentialKind::Refresh)?;
        let user = self.resolve(&claims).await?;
        self.issue_access(&user.email)
    }
}
