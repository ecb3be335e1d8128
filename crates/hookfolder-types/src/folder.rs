//! Remote folder types.

use serde::{Deserialize, Serialize};

/// MIME type marking a Drive file as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A directory node in the remote hierarchical store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name. Not unique in the store itself.
    pub name: String,
    /// Parent folder ids. Empty for top-level folders.
    #[serde(default)]
    pub parents: Vec<String>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parents: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }
}
