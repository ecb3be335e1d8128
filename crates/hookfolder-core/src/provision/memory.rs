//! In-memory [`FolderStore`].
//!
//! Used when no Drive credentials are configured (dry-run serving) and as the
//! fake store in tests. Search semantics match Drive's `name contains`:
//! substring matches in creation order, truncated to one page.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use hookfolder_types::error::StoreError;
use hookfolder_types::folder::Folder;

use super::store::FolderStore;

#[derive(Default)]
pub struct InMemoryFolderStore {
    folders: Mutex<Vec<Folder>>,
    next_id: AtomicUsize,
    creates: AtomicUsize,
    searches: AtomicUsize,
    failing: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryFolderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, so concurrent callers interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Pre-populate a folder, returning it.
    pub async fn seed(&self, name: &str, parents: &[String]) -> Folder {
        let folder = self.insert(name, parents);
        self.folders.lock().await.push(folder.clone());
        folder
    }

    /// Make every subsequent call fail with [`StoreError::Request`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `create_folder` calls.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub async fn folders(&self) -> Vec<Folder> {
        self.folders.lock().await.clone()
    }

    fn insert(&self, name: &str, parents: &[String]) -> Folder {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Folder::new(format!("folder-{n}"), name).with_parents(parents.to_vec())
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Request("in-memory store set to fail".to_string()));
        }
        Ok(())
    }
}

impl FolderStore for InMemoryFolderStore {
    async fn search_folders(
        &self,
        name_contains: &str,
        page_size: u32,
    ) -> Result<Vec<Folder>, StoreError> {
        self.enter().await?;
        self.searches.fetch_add(1, Ordering::SeqCst);
        let folders = self.folders.lock().await;
        Ok(folders
            .iter()
            .filter(|f| f.name.contains(name_contains))
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn get_folder(&self, id: &str) -> Result<Folder, StoreError> {
        self.enter().await?;
        let folders = self.folders.lock().await;
        folders
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<Folder, StoreError> {
        self.enter().await?;
        let folder = self.insert(name, parents);
        self.folders.lock().await.push(folder.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id = %folder.id, name, "created in-memory folder");
        Ok(folder)
    }
}
