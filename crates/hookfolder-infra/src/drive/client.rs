//! DriveFolderStore -- [`FolderStore`] over the Google Drive v3 REST API.
//!
//! Uses `files.list` for the name search, `files.get` for canonical records
//! and `files.create` for new folders. All calls pass `supportsAllDrives` so
//! shared drives work the same as "My Drive".

use std::time::Duration;

use secrecy::ExposeSecret;

use hookfolder_core::provision::FolderStore;
use hookfolder_types::error::StoreError;
use hookfolder_types::folder::{Folder, FOLDER_MIME_TYPE};

use super::auth::AccessTokenSource;
use super::types::{CreateFolderRequest, DriveFile, ErrorEnvelope, FileList};

const FILE_FIELDS: &str = "id,name,parents";
const LIST_FIELDS: &str = "files(id,name,parents),incompleteSearch";

/// Drive-backed folder store.
pub struct DriveFolderStore<T> {
    client: reqwest::Client,
    tokens: T,
    base_url: String,
}

impl<T: AccessTokenSource> DriveFolderStore<T> {
    /// `base_url` is the API origin, normally `https://www.googleapis.com`.
    pub fn new(tokens: T, base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(Self {
            client,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/drive/v3{}", self.base_url, path)
    }

    async fn send<R: serde::de::DeserializeOwned + Send>(
        &self,
        request: reqwest::RequestBuilder,
        subject: &str,
    ) -> Result<R, StoreError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                401 => StoreError::Auth(message),
                404 => StoreError::NotFound(subject.to_string()),
                code => StoreError::Api {
                    status: code,
                    message,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Quote a value for a Drive query string literal.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn folder_search_query(name_contains: &str) -> String {
    format!(
        "mimeType='{FOLDER_MIME_TYPE}' and name contains '{}' and trashed=false",
        escape_query_value(name_contains)
    )
}

impl<T: AccessTokenSource> FolderStore for DriveFolderStore<T> {
    async fn search_folders(
        &self,
        name_contains: &str,
        page_size: u32,
    ) -> Result<Vec<Folder>, StoreError> {
        let query = folder_search_query(name_contains);
        let page_size = page_size.to_string();
        let request = self.client.get(self.url("/files")).query(&[
            ("q", query.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);

        let list: FileList = self.send(request, name_contains).await?;
        if list.incomplete_search {
            tracing::warn!(name = name_contains, "drive reported an incomplete folder search");
        }
        tracing::debug!(name = name_contains, hits = list.files.len(), "drive folder search");

        Ok(list.files.into_iter().map(Folder::from).collect())
    }

    async fn get_folder(&self, id: &str) -> Result<Folder, StoreError> {
        let request = self
            .client
            .get(self.url(&format!("/files/{id}")))
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")]);

        let file: DriveFile = self.send(request, id).await?;
        Ok(file.into())
    }

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<Folder, StoreError> {
        let body = CreateFolderRequest {
            name,
            mime_type: FOLDER_MIME_TYPE,
            parents,
        };
        let request = self
            .client
            .post(self.url("/files"))
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
            .json(&body);

        let file: DriveFile = self.send(request, name).await?;
        tracing::info!(folder_id = %file.id, name, "created drive folder");
        Ok(file.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::drive::auth::StaticToken;

    async fn store(server: &MockServer) -> DriveFolderStore<StaticToken> {
        DriveFolderStore::new(StaticToken::new("test-token"), server.uri()).unwrap()
    }

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("plain"), "plain");
        assert_eq!(escape_query_value("it's"), "it\\'s");
        assert_eq!(escape_query_value(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_folder_search_query() {
        assert_eq!(
            folder_search_query("#3 Bob's bug"),
            "mimeType='application/vnd.google-apps.folder' and name contains '#3 Bob\\'s bug' and trashed=false"
        );
    }

    #[tokio::test]
    async fn test_search_folders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(header("authorization", "Bearer test-token"))
            .and(query_param("q", folder_search_query("Issues")))
            .and(query_param("pageSize", "100"))
            .and(query_param("supportsAllDrives", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [
                    {"id": "f1", "name": "Issues archive", "parents": ["root"]},
                    {"id": "f2", "name": "Issues", "parents": ["root"]}
                ]
            })))
            .mount(&server)
            .await;

        let folders = store(&server).await.search_folders("Issues", 100).await.unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[1], Folder::new("f2", "Issues").with_parents(vec!["root".into()]));
    }

    #[tokio::test]
    async fn test_get_folder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/f2"))
            .and(query_param("fields", "id,name,parents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "f2", "name": "Issues", "parents": ["root"]
            })))
            .mount(&server)
            .await;

        let folder = store(&server).await.get_folder("f2").await.unwrap();
        assert_eq!(folder.name, "Issues");
        assert_eq!(folder.parents, vec!["root".to_string()]);
    }

    #[tokio::test]
    async fn test_get_missing_folder_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "File not found: gone."}
            })))
            .mount(&server)
            .await;

        let err = store(&server).await.get_folder("gone").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "gone"));
    }

    #[tokio::test]
    async fn test_create_folder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .and(body_json(serde_json::json!({
                "name": "#7 Crash",
                "mimeType": "application/vnd.google-apps.folder",
                "parents": ["ws"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new-1", "name": "#7 Crash", "parents": ["ws"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let folder = store(&server)
            .await
            .create_folder("#7 Crash", &["ws".to_string()])
            .await
            .unwrap();
        assert_eq!(folder.id, "new-1");
        assert_eq!(folder.parents, vec!["ws".to_string()]);
    }

    #[tokio::test]
    async fn test_api_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "Insufficient permissions"}
            })))
            .mount(&server)
            .await;

        let err = store(&server).await.search_folders("x", 1).await.unwrap_err();
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Insufficient permissions");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = store(&server).await.search_folders("x", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/f1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = store(&server).await.get_folder("f1").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_provisioner_over_drive() {
        use hookfolder_core::provision::FolderProvisioner;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "ws-1", "name": "Issues", "parents": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provisioner = FolderProvisioner::new(store(&server).await, "Issues");
        let first = provisioner.workspace().await.unwrap();
        let second = provisioner.workspace().await.unwrap();
        assert_eq!(first.id, "ws-1");
        assert_eq!(second.id, "ws-1");
    }
}
