//! Configuration loader for hookfolder.
//!
//! Reads `hookfolder.toml` and deserializes it into [`AppConfig`], then
//! applies `HOOKFOLDER_*` environment overrides. A missing file yields the
//! defaults; a file that exists but does not parse is an error, since running
//! with a silently ignored secret or role would be worse than not starting.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use hookfolder_types::config::AppConfig;

pub const ENV_WEBHOOK_SECRET: &str = "HOOKFOLDER_WEBHOOK_SECRET";
pub const ENV_PORT: &str = "HOOKFOLDER_PORT";
pub const ENV_SERVICE_ACCOUNT: &str = "HOOKFOLDER_SERVICE_ACCOUNT";

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

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("no webhook secret configured (set {ENV_WEBHOOK_SECRET} or webhook.secret)")]
    MissingSecret,
}

/// Load `path` and apply overrides from the process environment.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config_file(path).await?;
    apply_env_overrides(config, |var| std::env::var(var).ok())
}

/// Parse the config file, or return defaults when it does not exist.
pub async fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay environment values on `config`. `lookup` returns a variable's value.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(secret) = non_empty(ENV_WEBHOOK_SECRET) {
        config.webhook.secret = Some(SecretString::from(secret));
    }

    if let Some(port) = non_empty(ENV_PORT) {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: ENV_PORT,
            value: port,
        })?;
    }

    if let Some(path) = non_empty(ENV_SERVICE_ACCOUNT) {
        config.drive.service_account_path = Some(PathBuf::from(path));
    }

    Ok(config)
}

/// The webhook secret, required to serve.
pub fn webhook_secret(config: &AppConfig) -> Result<SecretString, ConfigError> {
    config
        .webhook
        .secret
        .as_ref()
        .filter(|s| !s.expose_secret().is_empty())
        .cloned()
        .ok_or(ConfigError::MissingSecret)
}
