//! Remote folder store trait definition.
//!
//! Defines the capability the provisioner needs from a hierarchical storage
//! service. The infrastructure layer (hookfolder-infra) implements this
//! trait against the Google Drive v3 API.

use hookfolder_types::error::StoreError;
use hookfolder_types::folder::Folder;

/// Folder operations on the remote store.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait FolderStore: Send + Sync {
    /// Folders whose name *contains* `name_contains`, at most `page_size` of them.
    ///
    /// A single page only; callers must filter for exact matches themselves.
    fn search_folders(
        &self,
        name_contains: &str,
        page_size: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Folder>, StoreError>> + Send;

    /// Canonical record (id, name, parents) for a folder id.
    fn get_folder(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Folder, StoreError>> + Send;

    /// Create a folder under `parents` (empty = store root).
    fn create_folder(
        &self,
        name: &str,
        parents: &[String],
    ) -> impl std::future::Future<Output = Result<Folder, StoreError>> + Send;
}
