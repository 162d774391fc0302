//! Configuration loader for Parley.
//!
//! Reads `config.toml` (by default from the data directory, `~/.parley/`) into
//! [`AppConfig`], then applies `PARLEY_*` environment overrides. A missing
//! file yields defaults; a file that exists but does not parse is an error.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use parley_types::config::AppConfig;

use crate::sqlite::pool::default_database_url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("no signing secret configured (set auth.secret or PARLEY_JWT_SECRET)")]
    MissingSecret,
}

/// Resolve the data directory: `PARLEY_DATA_DIR`, else `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var_os("PARLEY_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parley"),
    }
}

/// Default config file location: `{data_dir}/config.toml`.
pub fn default_config_path() -> PathBuf {
    resolve_data_dir().join("config.toml")
}

/// Load configuration from `path` and the process environment.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = read_config_file(path).await?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<AppConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `PARLEY_*` overrides. `lookup` returns the raw value of a variable;
/// empty values count as unset.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("PARLEY_DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(secret) = get("PARLEY_JWT_SECRET") {
        config.auth.secret = Some(SecretString::from(secret));
    }
    if let Some(raw) = get("PARLEY_ACCESS_TTL_MINUTES") {
        config.auth.access_ttl_minutes = parse_positive("PARLEY_ACCESS_TTL_MINUTES", raw)?;
    }
    if let Some(raw) = get("PARLEY_REFRESH_TTL_DAYS") {
        config.auth.refresh_ttl_days = parse_positive("PARLEY_REFRESH_TTL_DAYS", raw)?;
    }
    if let Some(url) = get("PARLEY_COMPLETION_BASE_URL") {
        config.completion.base_url = url;
    }
    if let Some(key) = get("PARLEY_COMPLETION_API_KEY") {
        config.completion.api_key = Some(SecretString::from(key));
    }
    if let Some(model) = get("PARLEY_COMPLETION_MODEL") {
        config.completion.model = model;
    }
    Ok(())
}

fn parse_positive(name: &'static str, raw: String) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnv { name, value: raw }),
    }
}

/// The signing secret, or `MissingSecret`. There is no built-in fallback.
pub fn require_secret(config: &AppConfig) -> Result<&SecretString, ConfigError> {
    config.auth.secret.as_ref().ok_or(ConfigError::MissingSecret)
}

/// The configured database URL, or the data-directory default.
pub fn database_url(config: &AppConfig) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(default_database_url)
}
