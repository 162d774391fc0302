//! Application state wiring all services together.
//!
//! Services are generic over the persistence, crypto and completion ports;
//! AppState pins them to the concrete infra implementations. The completion
//! provider is type-erased so the host can swap it at startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;

use parley_core::auth::account::AccountService;
use parley_core::auth::token::TokenService;
use parley_core::chat::service::ChatService;
use parley_core::llm::box_provider::BoxCompletionProvider;
use parley_infra::config::{database_url, require_secret};
use parley_infra::crypto::jwt::JwtCodec;
use parley_infra::crypto::password::Argon2PasswordHasher;
use parley_infra::llm::openai_compat::OpenAiCompatibleProvider;
use parley_infra::sqlite::credential_store::SqliteCredentialStore;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::unit_of_work::SqliteUnitOfWorkFactory;
use parley_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAccountService =
    AccountService<SqliteUnitOfWorkFactory, SqliteCredentialStore, JwtCodec, Argon2PasswordHasher>;

pub type ConcreteChatService = ChatService<SqliteUnitOfWorkFactory, BoxCompletionProvider>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<ConcreteAccountService>,
    pub chats: Arc<ConcreteChatService>,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db_url = database_url(config);
        if let Some(path) = sqlite_file_parent(&db_url) {
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("creating {}", path.display()))?;
        }

        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("opening database")?;

        let api_key = match &config.completion.api_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!("no completion API key configured; chat requests will fail upstream");
                SecretString::from(String::new())
            }
        };
        let provider = OpenAiCompatibleProvider::new(
            config.completion.base_url.clone(),
            api_key,
            config.completion.model.clone(),
            Duration::from_secs(config.completion.timeout_secs),
        )?;

        Self::build(db_pool, config, BoxCompletionProvider::new(provider))
    }

    /// Wire services over an open pool and a chosen completion provider.
    pub fn build(
        db_pool: DatabasePool,
        config: &AppConfig,
        provider: BoxCompletionProvider,
    ) -> anyhow::Result<Self> {
        let secret = require_secret(config)?;
        let codec = JwtCodec::new(secret)?;

        let tokens = TokenService::new(
            SqliteCredentialStore::new(db_pool.clone()),
            codec,
            chrono::Duration::minutes(config.auth.access_ttl_minutes),
            chrono::Duration::days(config.auth.refresh_ttl_days),
            tracing::info_span!("tokens"),
        )?;

        let accounts = AccountService::new(
            SqliteUnitOfWorkFactory::new(db_pool.clone()),
            tokens,
            Argon2PasswordHasher::new(),
            tracing::info_span!("accounts"),
        );

        let chats = ChatService::new(
            SqliteUnitOfWorkFactory::new(db_pool),
            provider,
            tracing::info_span!("chats"),
        )
        .with_completion_timeout(Duration::from_secs(config.completion.timeout_secs))
        .with_history_limit(config.completion.history_limit);

        Ok(Self {
            accounts: Arc::new(accounts),
            chats: Arc::new(chats),
        })
    }
}

/// Directory holding a file-backed SQLite database, if the URL names one.
fn sqlite_file_parent(url: &str) -> Option<std::path::PathBuf> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
}
