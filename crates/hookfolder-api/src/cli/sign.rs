//! `hookfolder sign <file>`: print the signature header for a request body.
//!
//! Handy for replaying a delivery with curl:
//! `curl -H "$(hookfolder sign body.json)" --data-binary @body.json ...`

use std::path::Path;

use secrecy::ExposeSecret;

use hookfolder_core::webhook::sign;
use hookfolder_infra::config::webhook_secret;
use hookfolder_types::config::AppConfig;
use hookfolder_types::webhook::SignatureAlgorithm;

/// `Header-Name: <algorithm>=<hex>` for the bytes of `file`.
pub async fn signature_header(
    config: &AppConfig,
    file: &Path,
    algorithm: Option<SignatureAlgorithm>,
) -> anyhow::Result<String> {
    let secret = webhook_secret(config)?;
    let body = tokio::fs::read(file).await?;
    let algorithm = algorithm.unwrap_or(config.webhook.algorithm);

    let value = sign(algorithm, secret.expose_secret().as_bytes(), &body);
    Ok(format!("{}: {value}", header_display_name(algorithm)))
}

fn header_display_name(algorithm: SignatureAlgorithm) -> &'static str {
    match algorithm {
        SignatureAlgorithm::Sha1 => "X-Hub-Signature",
        SignatureAlgorithm::Sha256 => "X-Hub-Signature-256",
    }
}

pub async fn run(
    config: &AppConfig,
    file: &Path,
    algorithm: Option<SignatureAlgorithm>,
) -> anyhow::Result<()> {
    println!("{}", signature_header(config, file, algorithm).await?);
    Ok(())
}
