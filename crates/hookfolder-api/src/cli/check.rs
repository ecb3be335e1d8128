//! `hookfolder check-config`: validate settings without starting the server.

use std::time::Duration;

use serde_json::{json, Value};

use hookfolder_core::schedule::check_delay;
use hookfolder_infra::config::webhook_secret;
use hookfolder_infra::drive::ServiceAccountKey;
use hookfolder_types::config::AppConfig;

/// Validate `config` and return a summary safe to print (no secrets).
pub async fn summarize(config: &AppConfig) -> anyhow::Result<Value> {
    webhook_secret(config)?;
    check_delay(Duration::from_secs(config.webhook.delay_secs))?;

    let service_account = match &config.drive.service_account_path {
        Some(path) => {
            let key = ServiceAccountKey::from_file(path).await?;
            Value::String(key.client_email)
        }
        None => Value::Null,
    };
    let store = if config.drive.service_account_path.is_some() {
        "drive"
    } else {
        "memory"
    };

    Ok(json!({
        "server": format!("{}:{}", config.server.host, config.server.port),
        "webhook": {
            "secret": "set",
            "algorithm": config.webhook.algorithm.to_string(),
            "header": config.webhook.algorithm.header_name(),
            "delay_secs": config.webhook.delay_secs,
            "display_timezone": config.webhook.display_timezone.name(),
            "role": config.webhook.role,
        },
        "drive": {
            "workspace_name": config.drive.workspace_name,
            "service_account": service_account,
            "store": store,
        },
    }))
}

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let summary = summarize(config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
