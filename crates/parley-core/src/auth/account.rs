//! Account service: registration, login and session renewal.
//!
//! Registration writes through a unit of work; login and credential
//! resolution read through the token service's credential store.

use tracing::Span;

use parley_types::credential::{IssuedCredential, TokenPair};
use parley_types::error::{AuthError, RepositoryError};
use parley_types::user::{NewUser, Role, User, normalize_email};

use crate::repository::Repository;
use crate::repository::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

use super::password::{PasswordHasher, validate_password};
use super::store::CredentialStore;
use super::token::{TokenCodec, TokenService};

/// Message used for every failed login so callers cannot probe which emails
/// exist.
const LOGIN_FAILED: &str = "incorrect email or password";

/// Service orchestrating the account lifecycle.
///
/// Generic over the persistence and crypto ports -- parley-core never depends
/// on parley-infra.
pub struct AccountService<F, S, C, H>
where
    F: UnitOfWorkFactory,
    S: CredentialStore,
    C: TokenCodec,
    H: PasswordHasher,
{
    uow: F,
    tokens: TokenService<S, C>,
    hasher: H,
    span: Span,
}

impl<F, S, C, H> AccountService<F, S, C, H>
where
    F: UnitOfWorkFactory,
    S: CredentialStore,
    C: TokenCodec,
    H: PasswordHasher,
{
    pub fn new(uow: F, tokens: TokenService<S, C>, hasher: H, span: Span) -> Self {
        Self {
            uow,
            tokens,
            hasher,
            span,
        }
    }

    pub fn tokens(&self) -> &TokenService<S, C> {
        &self.tokens
    }

    /// Register a new user.
    ///
    /// The email is normalized before storage. A duplicate email fails with
    /// `AuthError::Conflict` and leaves the existing row untouched.
    #[tracing::instrument(name = "register", parent = &self.span, skip_all)]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        fullname: Option<String>,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        let hashed_password = self.hasher.hash(password)?;
        let fullname = fullname
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let new_user = NewUser {
            email: email.clone(),
            hashed_password,
            fullname,
            role: Role::User,
            is_active: true,
        };

        let mut uow = self.uow.begin().await?;
        let user = uow.users().add(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                tracing::warn!("registration attempted for an existing email");
                AuthError::Conflict(email.clone())
            }
            other => AuthError::Storage(other),
        })?;
        uow.commit().await?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Verify an email/password pair and issue an access + refresh pair.
    ///
    /// Unknown email, wrong password and disabled account all fail with the
    /// same `InvalidCredential`.
    #[tracing::instrument(name = "login", parent = &self.span, skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email);

        let user = match self.tokens.store().find_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("login for unknown email");
                return Err(AuthError::InvalidCredential(LOGIN_FAILED.to_string()));
            }
        };

        if !self.hasher.verify(password, &user.hashed_password) {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(AuthError::InvalidCredential(LOGIN_FAILED.to_string()));
        }

        if !user.is_active {
            tracing::warn!(user_id = user.id, "login for disabled account");
            return Err(AuthError::InvalidCredential(LOGIN_FAILED.to_string()));
        }

        let pair = self.tokens.issue_pair(&user.email)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(pair)
    }

    /// Exchange a refresh credential for a new access credential.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedCredential, AuthError> {
        self.tokens.rotate(refresh_token).await
    }

    /// Resolve the user behind an access credential.
    pub async fn me(&self, access_token: &str) -> Result<User, AuthError> {
        self.tokens.authenticate_bearer(access_token).await
    }
}

/// Minimal structural email check: one `@` with non-empty local part and a
/// dotted domain.
fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation(format!("invalid email address: '{email}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_plain_address() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.org").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        for bad in ["", "alice", "@example.com", "alice@", "alice@localhost", "a@b@c.d", "a b@c.d", "a@.com"] {
            assert!(
                matches!(validate_email(bad), Err(AuthError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }
}
