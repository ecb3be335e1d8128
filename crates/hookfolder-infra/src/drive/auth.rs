//! Service-account authentication for the Drive API.
//!
//! Exchanges a signed RS256 JWT assertion for an OAuth2 access token using
//! the `urn:ietf:params:oauth:grant-type:jwt-bearer` grant, then caches the
//! token until shortly before it expires.
//!
//! The private key and access tokens are wrapped in [`SecretString`] and are
//! never logged.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use hookfolder_types::error::StoreError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Token source trait
// ---------------------------------------------------------------------------

/// Supplies bearer tokens for Drive requests.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(
        &self,
    ) -> impl std::future::Future<Output = Result<SecretString, StoreError>> + Send;
}

/// A fixed token. Useful behind an auth proxy and in tests.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, StoreError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Service account key
// ---------------------------------------------------------------------------

/// The fields of a Google service-account JSON key file that we use.
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    pub token_uri: Option<String>,
}

#[derive(Deserialize)]
struct KeyFile {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let file: KeyFile = serde_json::from_str(json)
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {e}")))?;
        Ok(Self {
            client_email: file.client_email,
            private_key: SecretString::from(file.private_key),
            token_uri: file.token_uri,
        })
    }

    pub async fn from_file(path: &Path) -> Result<Self, StoreError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Auth(format!(
                "cannot read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}

// ---------------------------------------------------------------------------
// JWT bearer flow
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq, Eq)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl AssertionClaims {
    fn new(client_email: &str, scopes: &[String], audience: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: client_email.to_string(),
            scope: scopes.join(" "),
            aud: audience.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens for a service account.
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    key: ServiceAccountKey,
    scopes: Vec<String>,
    token_url: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// `token_url` is used unless the key file names its own `token_uri`.
    pub fn new(
        key: ServiceAccountKey,
        scopes: Vec<String>,
        token_url: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let token_url = key.token_uri.clone().unwrap_or_else(|| token_url.into());

        Ok(Self {
            client,
            key,
            scopes,
            token_url,
            cached: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims::new(&self.key.client_email, &self.scopes, &self.token_url, now);
        let key = EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid private key: {e}")))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {e}")))
    }

    async fn fetch_token(&self) -> Result<CachedToken, StoreError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "obtained drive access token"
        );

        Ok(CachedToken {
            token: SecretString::from(token.access_token),
            expires_at: now + TimeDelta::seconds(token.expires_in),
        })
    }
}

impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<SecretString, StoreError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY_PEM: &str = include_str!("../../testdata/service_account_test_key.pem");

    fn key_json(token_uri: Option<&str>) -> String {
        let mut value = serde_json::json!({
            "type": "service_account",
            "client_email": "bot@project.iam.gserviceaccount.com",
            "private_key": TEST_KEY_PEM,
        });
        if let Some(uri) = token_uri {
            value["token_uri"] = serde_json::Value::String(uri.to_string());
        }
        value.to_string()
    }

    fn scopes() -> Vec<String> {
        vec!["https://www.googleapis.com/auth/drive".to_string()]
    }

    #[test]
    fn test_claims_shape() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = AssertionClaims::new(
            "bot@x",
            &["a".to_string(), "b".to_string()],
            "https://oauth2.googleapis.com/token",
            now,
        );
        assert_eq!(
            claims,
            AssertionClaims {
                iss: "bot@x".to_string(),
                scope: "a b".to_string(),
                aud: "https://oauth2.googleapis.com/token".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_003_600,
            }
        );
    }

    #[test]
    fn test_key_debug_redacts_private_key() {
        let key = ServiceAccountKey::from_json(&key_json(None)).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("bot@project.iam.gserviceaccount.com"));
        assert!(!rendered.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn test_invalid_key_json() {
        let err = ServiceAccountKey::from_json("{}").unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));
    }

    #[tokio::test]
    async fn test_key_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sa.json");
        tokio::fs::write(&path, key_json(None)).await.unwrap();

        let key = ServiceAccountKey::from_file(&path).await.unwrap();
        assert_eq!(key.client_email, "bot@project.iam.gserviceaccount.com");

        let missing = ServiceAccountKey::from_file(&dir.path().join("nope.json")).await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_assertion_is_three_part_jwt() {
        let key = ServiceAccountKey::from_json(&key_json(None)).unwrap();
        let source = ServiceAccountTokenSource::new(key, scopes(), "https://example/token").unwrap();
        let jwt = source.assertion(Utc::now()).unwrap();
        assert_eq!(jwt.split('.').count(), 3);
    }

    #[test]
    fn test_bad_private_key_is_auth_error() {
        let mut key = ServiceAccountKey::from_json(&key_json(None)).unwrap();
        key.private_key = SecretString::from("not a pem");
        let source = ServiceAccountTokenSource::new(key, scopes(), "https://example/token").unwrap();
        assert!(matches!(source.assertion(Utc::now()), Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_token_exchange_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.test-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = ServiceAccountKey::from_json(&key_json(None)).unwrap();
        let source =
            ServiceAccountTokenSource::new(key, scopes(), format!("{}/token", server.uri())).unwrap();

        let first = source.access_token().await.unwrap();
        let second = source.access_token().await.unwrap();
        assert_eq!(first.expose_secret(), "ya29.test-token");
        assert_eq!(second.expose_secret(), "ya29.test-token");
        // `.expect(1)` is verified when the server drops.
    }

    #[tokio::test]
    async fn test_key_token_uri_overrides_configured_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/from-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "from-key-token",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let key_uri = format!("{}/from-key", server.uri());
        let key = ServiceAccountKey::from_json(&key_json(Some(&key_uri))).unwrap();
        let source =
            ServiceAccountTokenSource::new(key, scopes(), format!("{}/unused", server.uri())).unwrap();

        assert_eq!(source.access_token().await.unwrap().expose_secret(), "from-key-token");
    }

    #[tokio::test]
    async fn test_token_endpoint_error_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let key = ServiceAccountKey::from_json(&key_json(None)).unwrap();
        let source =
            ServiceAccountTokenSource::new(key, scopes(), format!("{}/token", server.uri())).unwrap();

        let err = source.access_token().await.unwrap_err();
        assert!(matches!(&err, StoreError::Auth(msg) if msg.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("abc");
        assert_eq!(source.access_token().await.unwrap().expose_secret(), "abc");
    }
}
