//! Application state wiring the pipeline, scheduler and folder store together.
//!
//! The core types are generic over [`FolderStore`]; `AppState` pins them to
//! [`AppFolderStore`], which is the Drive store when a service account is
//! configured and an in-memory store otherwise.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use hookfolder_core::action::{ActionRegistry, ProvisionIssueFolder};
use hookfolder_core::pipeline::WebhookPipeline;
use hookfolder_core::provision::{FolderProvisioner, FolderStore, InMemoryFolderStore};
use hookfolder_core::schedule::{check_delay, DeferredScheduler, SchedulerOptions};
use hookfolder_core::webhook::EventClassifier;
use hookfolder_infra::config::webhook_secret;
use hookfolder_infra::drive::{DriveFolderStore, ServiceAccountKey, ServiceAccountTokenSource};
use hookfolder_types::config::{AppConfig, SchedulerRole};
use hookfolder_types::error::StoreError;
use hookfolder_types::folder::Folder;

/// Folder store selected at startup.
pub enum AppFolderStore {
    Drive(DriveFolderStore<ServiceAccountTokenSource>),
    Memory(InMemoryFolderStore),
}

impl AppFolderStore {
    /// Drive store from `config.drive`, or the in-memory store when no
    /// service account key is configured.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let Some(path) = &config.drive.service_account_path else {
            tracing::warn!(
                "no drive.service_account_path configured; folders will be kept in memory only"
            );
            return Ok(Self::Memory(InMemoryFolderStore::new()));
        };

        let key = ServiceAccountKey::from_file(path).await?;
        tracing::info!(client_email = %key.client_email, "using Google Drive service account");
        let tokens =
            ServiceAccountTokenSource::new(key, config.drive.scopes.clone(), &config.drive.token_url)?;
        Ok(Self::Drive(DriveFolderStore::new(
            tokens,
            &config.drive.api_base_url,
        )?))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Drive(_) => "drive",
            Self::Memory(_) => "memory",
        }
    }
}

impl FolderStore for AppFolderStore {
    async fn search_folders(
        &self,
        name_contains: &str,
        page_size: u32,
    ) -> Result<Vec<Folder>, StoreError> {
        match self {
            Self::Drive(store) => store.search_folders(name_contains, page_size).await,
            Self::Memory(store) => store.search_folders(name_contains, page_size).await,
        }
    }

    async fn get_folder(&self, id: &str) -> Result<Folder, StoreError> {
        match self {
            Self::Drive(store) => store.get_folder(id).await,
            Self::Memory(store) => store.get_folder(id).await,
        }
    }

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<Folder, StoreError> {
        match self {
            Self::Drive(store) => store.create_folder(name, parents).await,
            Self::Memory(store) => store.create_folder(name, parents).await,
        }
    }
}

pub type ConcreteProvisioner = FolderProvisioner<AppFolderStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<WebhookPipeline>,
    pub scheduler: Arc<DeferredScheduler>,
    pub provisioner: Arc<ConcreteProvisioner>,
}

impl AppState {
    /// Build the state from a loaded config: resolve the secret, open the
    /// folder store and register the `opened` action.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let secret = webhook_secret(config)?;
        let store = AppFolderStore::from_config(config).await?;
        Self::build(config, secret, store)
    }

    pub fn build(
        config: &AppConfig,
        secret: SecretString,
        store: AppFolderStore,
    ) -> anyhow::Result<Self> {
        let delay = Duration::from_secs(config.webhook.delay_secs);
        check_delay(delay)?;
        let options = SchedulerOptions {
            delay,
            display_timezone: config.webhook.display_timezone,
            role: config.webhook.role,
        };
        if options.role == SchedulerRole::Replica {
            tracing::warn!("running as scheduler replica; accepted deliveries will not be scheduled here");
        }

        let store_kind = store.kind();
        let provisioner = Arc::new(FolderProvisioner::new(
            store,
            config.drive.workspace_name.clone(),
        ));

        let actions = Arc::new(ActionRegistry::new().with(
            "opened",
            Arc::new(ProvisionIssueFolder::new(Arc::clone(&provisioner))),
        ));

        let scheduler = Arc::new(DeferredScheduler::new(Arc::clone(&actions), options));
        let classifier = EventClassifier::new(secret, config.webhook.algorithm);
        let pipeline = Arc::new(WebhookPipeline::new(
            classifier,
            Arc::clone(&actions),
            Arc::clone(&scheduler),
        ));

        tracing::info!(
            store = store_kind,
            workspace = %config.drive.workspace_name,
            algorithm = %config.webhook.algorithm,
            delay_secs = config.webhook.delay_secs,
            timezone = %config.webhook.display_timezone,
            actions = ?actions.names(),
            "application state ready"
        );

        Ok(Self {
            pipeline,
            scheduler,
            provisioner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_without_service_account_uses_memory_store() {
        let store = AppFolderStore::from_config(&AppConfig::default()).await.unwrap();
        assert_eq!(store.kind(), "memory");
    }

    #[tokio::test]
    async fn test_missing_key_file_is_an_error() {
        let mut config = AppConfig::default();
        config.drive.service_account_path = Some("/nonexistent/hookfolder-sa.json".into());
        assert!(AppFolderStore::from_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_init_requires_secret() {
        assert!(AppState::init(&AppConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_build_rejects_unrepresentable_delay() {
        let mut config = AppConfig::default();
        config.webhook.delay_secs = u64::MAX;
        let result = AppState::build(
            &config,
            SecretString::from("s"),
            AppFolderStore::Memory(InMemoryFolderStore::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_applies_role_and_workspace() {
        let mut config = AppConfig::default();
        config.webhook.role = SchedulerRole::Replica;
        let state = AppState::build(
            &config,
            SecretString::from("s"),
            AppFolderStore::Memory(InMemoryFolderStore::new()),
        )
        .unwrap();
        assert_eq!(state.scheduler.role(), SchedulerRole::Replica);
        assert_eq!(state.provisioner.workspace_name(), "hookfolder");
    }
}
