//! Check-then-act folder provisioning.
//!
//! `ensure_folder` searches for an existing folder by name and creates one
//! only when no exact match exists. The remote store offers no
//! create-if-absent primitive, so two callers could both miss and both
//! create. Within one process this is prevented by a per-name async lock:
//! concurrent callers for the same name run one at a time, and the second
//! finds the folder the first created. Separate processes can still race.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OnceCell};

use hookfolder_types::error::ProvisionError;
use hookfolder_types::folder::Folder;

use super::store::FolderStore;

/// Results requested per search. Search is a pre-filter: a page that is too
/// small can be filled by substring matches and hide the exact one.
pub const SEARCH_PAGE_SIZE: u32 = 100;

pub struct FolderProvisioner<S> {
    store: S,
    workspace_name: String,
    workspace: OnceCell<Folder>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: FolderStore> FolderProvisioner<S> {
    pub fn new(store: S, workspace_name: impl Into<String>) -> Self {
        Self {
            store,
            workspace_name: workspace_name.into(),
            workspace: OnceCell::new(),
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    /// Find a folder whose name is exactly `name`.
    ///
    /// `Ok(None)` means the store answered and no such folder exists; remote
    /// failures are returned as errors.
    pub async fn lookup_folder(&self, name: &str) -> Result<Option<Folder>, ProvisionError> {
        if name.is_empty() {
            return Err(ProvisionError::EmptyName);
        }

        let candidates = self.store.search_folders(name, SEARCH_PAGE_SIZE).await?;
        let Some(hit) = candidates.into_iter().find(|f| f.name == name) else {
            tracing::debug!(name, "no exact folder match");
            return Ok(None);
        };

        let folder = self.store.get_folder(&hit.id).await?;
        Ok(Some(folder))
    }

    /// Return the folder named `name`, creating it under `parents` if absent.
    pub async fn ensure_folder(
        &self,
        name: &str,
        parents: &[String],
    ) -> Result<Folder, ProvisionError> {
        if name.is_empty() {
            return Err(ProvisionError::EmptyName);
        }

        let entry = self.lock_for(name);
        let _guard = entry.lock.lock().await;
        self.lookup_or_create(name, parents).await
    }

    /// The workspace root, created on first use and cached afterwards.
    pub async fn workspace(&self) -> Result<Folder, ProvisionError> {
        let folder = self
            .workspace
            .get_or_try_init(|| async {
                let folder = self.ensure_folder(&self.workspace_name, &[]).await?;
                tracing::info!(id = %folder.id, name = %folder.name, "workspace root resolved");
                Ok::<Folder, ProvisionError>(folder)
            })
            .await?;
        Ok(folder.clone())
    }

    async fn lookup_or_create(
        &self,
        name: &str,
        parents: &[String],
    ) -> Result<Folder, ProvisionError> {
        if let Some(existing) = self.lookup_folder(name).await? {
            tracing::debug!(id = %existing.id, name, "folder already exists");
            return Ok(existing);
        }

        let created = self.store.create_folder(name, parents).await?;
        tracing::info!(id = %created.id, name, ?parents, "created folder");
        Ok(created)
    }

    fn lock_for<'a>(&'a self, name: &'a str) -> NameLock<'a> {
        let lock = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        NameLock {
            locks: &self.locks,
            name,
            lock,
        }
    }
}

/// Shared handle on one name's lock. Dropping it, whether the caller finished
/// or its future was cancelled, removes the map entry once nobody else holds
/// or waits on it.
struct NameLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    name: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for NameLock<'_> {
    fn drop(&mut self) {
        // The map entry and this handle are the only two references.
        self.locks.remove_if(self.name, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}
