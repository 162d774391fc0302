//! CredentialStore trait definition.
//!
//! The token service resolves credential subjects through this port only.
//! It reads committed state and never participates in a unit of work.

use parley_types::error::RepositoryError;
use parley_types::user::User;

/// Read access to persisted identities.
pub trait CredentialStore: Send + Sync {
    /// Find a user by (normalized) email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
