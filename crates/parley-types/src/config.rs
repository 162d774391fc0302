//! Process configuration types for Parley.
//!
//! `AppConfig` mirrors `config.toml`. Every field has a default except the
//! signing secret, which must be supplied by the file or the environment.

use secrecy::SecretString;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL. When absent the host derives one from the data directory.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared by every credential the process issues.
    #[serde(default)]
    pub secret: Option<SecretString>,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

fn default_access_ttl_minutes() -> i64 {
    15
}

fn default_refresh_ttl_days() -> i64 {
    7
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of most recent messages sent as context when appending.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_base_url() -> String {
    "https://dashscope-intl.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_history_limit() -> u32 {
    20
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            history_limit: default_history_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert!(config.database.url.is_none());
        assert!(config.auth.secret.is_none());
        assert_eq!(config.auth.access_ttl_minutes, 15);
        assert_eq!(config.auth.refresh_ttl_days, 7);
        assert_eq!(config.completion.model, "qwen-plus");
        assert_eq!(config.completion.history_limit, 20);
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.auth.access_ttl_minutes, 15);
        assert_eq!(config.completion.timeout_secs, 60);
    }

    #[test]
    fn test_app_config_deserialize_with_values() {
        let toml_str = r#"
[database]
url = "sqlite://chat.db?mode=rwc"

[auth]
secret = "s3cr3t"
access_ttl_minutes = 5

[completion]
base_url = "http://localhost:11434/v1"
model = "llama3"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite://chat.db?mode=rwc"));
        assert_eq!(
            config.auth.secret.as_ref().map(|s| s.expose_secret().to_string()),
            Some("s3cr3t".to_string())
        );
        assert_eq!(config.auth.access_ttl_minutes, 5);
        assert_eq!(config.auth.refresh_ttl_days, 7);
        assert_eq!(config.completion.model, "llama3");
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let config: AppConfig = toml::from_str("[auth]\nsecret = \"hunter2\"").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
