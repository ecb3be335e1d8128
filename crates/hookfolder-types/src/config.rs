//! Configuration types for hookfolder.
//!
//! `AppConfig` mirrors the `hookfolder.toml` file. Every field has a default,
//! so an empty or missing file yields a runnable configuration (apart from the
//! webhook secret, which normally comes from the environment).

use std::path::PathBuf;

use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::webhook::SignatureAlgorithm;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub drive: DriveConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Whether this process arms timers for accepted deliveries.
///
/// Exactly one coordinator should run per deployment; replicas answer
/// webhooks identically but never schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerRole {
    #[default]
    Coordinator,
    Replica,
}

/// Webhook verification and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret. Usually supplied via `HOOKFOLDER_WEBHOOK_SECRET` instead.
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub secret: Option<SecretString>,
    #[serde(default)]
    pub algorithm: SignatureAlgorithm,
    /// Delay between acceptance and handler invocation.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// IANA timezone used when logging fire times, e.g. `America/New_York`.
    #[serde(default = "default_display_timezone")]
    pub display_timezone: Tz,
    #[serde(default)]
    pub role: SchedulerRole,
}

fn default_delay_secs() -> u64 {
    60
}

fn default_display_timezone() -> Tz {
    chrono_tz::America::New_York
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: SignatureAlgorithm::default(),
            delay_secs: default_delay_secs(),
            display_timezone: default_display_timezone(),
            role: SchedulerRole::default(),
        }
    }
}

/// Google Drive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Name of the workspace root folder.
    #[serde(default = "default_workspace_name")]
    pub workspace_name: String,
    /// Path to the service-account JSON key file.
    #[serde(default)]
    pub service_account_path: Option<PathBuf>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_workspace_name() -> String {
    "hookfolder".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/drive".to_string()]
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            workspace_name: default_workspace_name(),
            service_account_path: None,
            scopes: default_scopes(),
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
        }
    }
}
