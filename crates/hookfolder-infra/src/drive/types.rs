//! Drive v3 wire types (only the fields we request).

use serde::{Deserialize, Serialize};

use hookfolder_types::folder::Folder;

/// `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub incomplete_search: bool,
}

/// A file resource as returned with `fields=id,name,parents`.
#[derive(Debug, Deserialize)]
pub(crate) struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl From<DriveFile> for Folder {
    fn from(file: DriveFile) -> Self {
        Folder::new(file.id, file.name).with_parents(file.parents)
    }
}

/// `files.create` metadata body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub parents: &'a [String],
}

/// Google API error envelope: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_list_tolerates_missing_fields() {
        let list: FileList = serde_json::from_str(r#"{"files":[{"id":"a"}]}"#).unwrap();
        assert_eq!(list.files.len(), 1);
        assert!(!list.incomplete_search);

        let folder: Folder = list.files.into_iter().next().unwrap().into();
        assert_eq!(folder.id, "a");
        assert!(folder.name.is_empty());
        assert!(folder.parents.is_empty());
    }

    #[test]
    fn test_create_request_omits_empty_parents() {
        let body = CreateFolderRequest {
            name: "Issues",
            mime_type: hookfolder_types::folder::FOLDER_MIME_TYPE,
            parents: &[],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Issues",
                "mimeType": "application/vnd.google-apps.folder"
            })
        );
    }
}
