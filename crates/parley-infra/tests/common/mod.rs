//! Shared fixtures for the parley-infra integration suites.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tracing::Span;

use parley_core::auth::account::AccountService;
use parley_core::auth::token::TokenService;
use parley_core::chat::service::ChatService;
use parley_core::llm::provider::CompletionProvider;
use parley_infra::crypto::jwt::JwtCodec;
use parley_infra::crypto::password::Argon2PasswordHasher;
use parley_infra::sqlite::credential_store::SqliteCredentialStore;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::unit_of_work::SqliteUnitOfWorkFactory;
use parley_types::llm::{ChatTurn, CompletionError};

pub type Accounts =
    AccountService<SqliteUnitOfWorkFactory, SqliteCredentialStore, JwtCodec, Argon2PasswordHasher>;

pub async fn test_pool() -> DatabasePool {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);
    DatabasePool::new(&url).await.unwrap()
}

pub fn accounts(pool: &DatabasePool) -> Accounts {
    let codec = JwtCodec::new(&SecretString::from("integration-secret".to_string())).unwrap();
    let tokens = TokenService::new(
        SqliteCredentialStore::new(pool.clone()),
        codec,
        chrono::Duration::minutes(15),
        chrono::Duration::days(7),
        Span::none(),
    )
    .unwrap();
    AccountService::new(
        SqliteUnitOfWorkFactory::new(pool.clone()),
        tokens,
        Argon2PasswordHasher::new(),
        Span::none(),
    )
}

pub fn chats<P: CompletionProvider>(
    pool: &DatabasePool,
    provider: P,
) -> ChatService<SqliteUnitOfWorkFactory, P> {
    ChatService::new(SqliteUnitOfWorkFactory::new(pool.clone()), provider, Span::none())
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, CompletionError>>,
    calls: Vec<Vec<ChatTurn>>,
}

/// Completion provider that replays canned results in order and records
/// every history it was sent. Runs out into `Unavailable`.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn replying(replies: &[&str]) -> Self {
        let provider = Self::default();
        {
            let mut script = provider.script.lock().unwrap();
            script.replies = replies.iter().map(|r| Ok(r.to_string())).collect();
        }
        provider
    }

    pub fn failing(err: CompletionError) -> Self {
        let provider = Self::default();
        provider.script.lock().unwrap().replies.push_back(Err(err));
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, CompletionError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(history.to_vec());
            script.replies.pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Err(CompletionError::Unavailable("script exhausted".to_string())))
    }
}
